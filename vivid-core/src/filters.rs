use thiserror::Error;

/// Errors produced while parsing a filter-graph fragment.
///
/// Preset fragments are expected to be pre-validated, so any of these
/// aborts the whole combination request instead of degrading to a
/// partial filter.
#[derive(Debug, Error)]
pub enum FilterParseError {
    #[error("invalid numeric value `{value}` for {filter} parameter `{param}`")]
    InvalidNumber {
        filter: &'static str,
        param: String,
        value: String,
    },
    #[error("unsharp filter needs at least luma_x:luma_y:luma_amount, got `{0}`")]
    UnsharpArity(String),
}

/// A numeric literal that keeps its source text.
///
/// Unsharp amounts are re-emitted exactly as written (`1.0` stays
/// `1.0`), while comparisons use the parsed value.
#[derive(Debug, Clone, PartialEq)]
pub struct Amount {
    raw: String,
    value: f64,
}

impl Amount {
    fn parse(raw: &str, filter: &'static str, param: &str) -> Result<Self, FilterParseError> {
        let value = raw
            .parse::<f64>()
            .map_err(|_| FilterParseError::InvalidNumber {
                filter,
                param: param.to_string(),
                value: raw.to_string(),
            })?;
        Ok(Self {
            raw: raw.to_string(),
            value,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Parameters of an `eq=` invocation. Only the four supported keys are
/// captured; anything else in the fragment is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EqParams {
    pub contrast: Option<f64>,
    pub brightness: Option<f64>,
    pub saturation: Option<f64>,
    pub gamma: Option<f64>,
}

/// Shadow-channel shifts of a `colorbalance=` invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorBalanceParams {
    pub rs: Option<f64>,
    pub gs: Option<f64>,
    pub bs: Option<f64>,
}

/// Positional parameters of an `unsharp=` invocation.
///
/// The chroma triple is optional in the source fragment; when absent it
/// defaults to the luma kernel dimensions with a chroma amount of `0.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsharpParams {
    pub luma_x: u32,
    pub luma_y: u32,
    pub luma_amount: Amount,
    pub chroma_x: u32,
    pub chroma_y: u32,
    pub chroma_amount: Amount,
}

/// A single parsed filter invocation from a preset fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterInvocation {
    Eq(EqParams),
    ColorBalance(ColorBalanceParams),
    Unsharp(UnsharpParams),
    /// Opaque passthrough; the full `curves=...` token is kept verbatim.
    Curves(String),
    /// Unrecognized filter family; dropped during combination.
    Unknown(String),
}

/// Parse a filter-graph fragment into typed invocations.
///
/// Splits on top-level commas (none of the supported filters nest
/// commas in their parameter lists) and classifies each token by its
/// prefix. Pure and side-effect-free.
pub fn parse_fragment(fragment: &str) -> Result<Vec<FilterInvocation>, FilterParseError> {
    let mut invocations = Vec::new();

    for token in fragment.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }

        let invocation = if let Some(params) = token.strip_prefix("eq=") {
            FilterInvocation::Eq(parse_eq(params)?)
        } else if let Some(params) = token.strip_prefix("colorbalance=") {
            FilterInvocation::ColorBalance(parse_colorbalance(params)?)
        } else if let Some(params) = token.strip_prefix("unsharp=") {
            FilterInvocation::Unsharp(parse_unsharp(params)?)
        } else if token.starts_with("curves=") {
            FilterInvocation::Curves(token.to_string())
        } else {
            FilterInvocation::Unknown(token.to_string())
        };

        invocations.push(invocation);
    }

    Ok(invocations)
}

fn parse_scalar(raw: &str, filter: &'static str, param: &str) -> Result<f64, FilterParseError> {
    raw.parse::<f64>()
        .map_err(|_| FilterParseError::InvalidNumber {
            filter,
            param: param.to_string(),
            value: raw.to_string(),
        })
}

fn parse_kernel_size(raw: &str, param: &str) -> Result<u32, FilterParseError> {
    raw.parse::<u32>()
        .map_err(|_| FilterParseError::InvalidNumber {
            filter: "unsharp",
            param: param.to_string(),
            value: raw.to_string(),
        })
}

fn parse_eq(params: &str) -> Result<EqParams, FilterParseError> {
    let mut eq = EqParams::default();
    for param in params.split(':') {
        // Entries without `=` and unknown keys are ignored
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key {
            "contrast" => eq.contrast = Some(parse_scalar(value, "eq", key)?),
            "brightness" => eq.brightness = Some(parse_scalar(value, "eq", key)?),
            "saturation" => eq.saturation = Some(parse_scalar(value, "eq", key)?),
            "gamma" => eq.gamma = Some(parse_scalar(value, "eq", key)?),
            _ => {}
        }
    }
    Ok(eq)
}

fn parse_colorbalance(params: &str) -> Result<ColorBalanceParams, FilterParseError> {
    let mut cb = ColorBalanceParams::default();
    for param in params.split(':') {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key {
            "rs" => cb.rs = Some(parse_scalar(value, "colorbalance", key)?),
            "gs" => cb.gs = Some(parse_scalar(value, "colorbalance", key)?),
            "bs" => cb.bs = Some(parse_scalar(value, "colorbalance", key)?),
            _ => {}
        }
    }
    Ok(cb)
}

fn parse_unsharp(params: &str) -> Result<UnsharpParams, FilterParseError> {
    let parts: Vec<&str> = params.split(':').collect();
    if parts.len() < 3 {
        return Err(FilterParseError::UnsharpArity(params.to_string()));
    }

    let luma_x = parse_kernel_size(parts[0], "luma_x")?;
    let luma_y = parse_kernel_size(parts[1], "luma_y")?;
    let luma_amount = Amount::parse(parts[2], "unsharp", "luma_amount")?;

    let chroma_x = match parts.get(3) {
        Some(raw) => parse_kernel_size(raw, "chroma_x")?,
        None => luma_x,
    };
    let chroma_y = match parts.get(4) {
        Some(raw) => parse_kernel_size(raw, "chroma_y")?,
        None => luma_y,
    };
    let chroma_amount = match parts.get(5) {
        Some(raw) => Amount::parse(raw, "unsharp", "chroma_amount")?,
        None => Amount {
            raw: "0.0".to_string(),
            value: 0.0,
        },
    };

    Ok(UnsharpParams {
        luma_x,
        luma_y,
        luma_amount,
        chroma_x,
        chroma_y,
        chroma_amount,
    })
}

//! Merging of preset filter fragments into one composite filter graph.
//!
//! Naively concatenating preset fragments would apply `eq` contrast
//! twice, stack competing `unsharp` kernels, and could hand the
//! encoder invalid even kernel sizes. Instead each filter family is
//! folded with a family-specific rule and the result is serialized as
//! a single fragment.

use thiserror::Error;

use crate::filters::{self, FilterInvocation, FilterParseError, UnsharpParams};
use crate::presets::{NONE_PRESET, PresetStore};

#[derive(Debug, Error)]
pub enum CombineError {
    #[error("unknown preset id `{0}`")]
    UnknownPreset(String),
    #[error(transparent)]
    Parse(#[from] FilterParseError),
}

/// Running `eq=` parameter set.
///
/// Contrast, saturation and gamma are scale factors, so they start at
/// the multiplicative identity and compose by multiplication; two
/// presets each boosting contrast by 1.2 combine to 1.44. Brightness
/// is an offset and composes by addition.
#[derive(Debug, Clone)]
pub struct EqState {
    pub contrast: f64,
    pub brightness: f64,
    pub saturation: f64,
    pub gamma: f64,
}

impl Default for EqState {
    fn default() -> Self {
        Self {
            contrast: 1.0,
            brightness: 0.0,
            saturation: 1.0,
            gamma: 1.0,
        }
    }
}

/// Running shadow-channel shifts; offsets compose by addition.
#[derive(Debug, Clone, Default)]
pub struct ColorBalanceState {
    pub rs: f64,
    pub gs: f64,
    pub bs: f64,
}

/// Accumulator for one combination run. Created fresh per request and
/// discarded after serialization; holds no shared state.
#[derive(Debug, Clone, Default)]
pub struct CombinedFilters {
    eq: EqState,
    colorbalance: ColorBalanceState,
    unsharp: Option<UnsharpParams>,
    curves: Vec<String>,
}

/// Shift a kernel dimension to the nearest valid odd size. The
/// encoder accepts odd matrix sizes of 3 and up, nothing smaller.
fn odd_kernel(value: u32) -> u32 {
    let odd = if value % 2 == 0 {
        if value > 1 { value - 1 } else { 3 }
    } else {
        value
    };
    odd.max(3)
}

/// Normalize all four kernel dimensions before an invocation is
/// stored as the winner. The encoder rejects even unsharp matrices.
fn normalize_kernels(mut unsharp: UnsharpParams) -> UnsharpParams {
    unsharp.luma_x = odd_kernel(unsharp.luma_x);
    unsharp.luma_y = odd_kernel(unsharp.luma_y);
    unsharp.chroma_x = odd_kernel(unsharp.chroma_x);
    unsharp.chroma_y = odd_kernel(unsharp.chroma_y);
    unsharp
}

impl CombinedFilters {
    /// Fold one invocation into the accumulator.
    pub fn apply(&mut self, invocation: FilterInvocation) {
        match invocation {
            FilterInvocation::Eq(eq) => {
                if let Some(contrast) = eq.contrast {
                    self.eq.contrast *= contrast;
                }
                if let Some(brightness) = eq.brightness {
                    self.eq.brightness += brightness;
                }
                if let Some(saturation) = eq.saturation {
                    self.eq.saturation *= saturation;
                }
                if let Some(gamma) = eq.gamma {
                    self.eq.gamma *= gamma;
                }
            }
            FilterInvocation::ColorBalance(cb) => {
                if let Some(rs) = cb.rs {
                    self.colorbalance.rs += rs;
                }
                if let Some(gs) = cb.gs {
                    self.colorbalance.gs += gs;
                }
                if let Some(bs) = cb.bs {
                    self.colorbalance.bs += bs;
                }
            }
            FilterInvocation::Unsharp(unsharp) => {
                // Strongest luma amount wins; ties keep the first seen
                let is_stronger = match &self.unsharp {
                    Some(current) => unsharp.luma_amount.value() > current.luma_amount.value(),
                    None => true,
                };
                if is_stronger {
                    self.unsharp = Some(normalize_kernels(unsharp));
                }
            }
            FilterInvocation::Curves(token) => {
                self.curves.push(token);
            }
            FilterInvocation::Unknown(token) => {
                log::debug!("Dropping unknown filter invocation: {}", token);
            }
        }
    }

    /// Serialize the accumulated state into a filter-graph fragment.
    ///
    /// The `eq=` term is always emitted, identity values included, so
    /// output is stable and diffable. `colorbalance=` appears only when
    /// some channel shift is meaningfully non-zero. Only the first
    /// collected `curves=` token is emitted; curve composition is not
    /// linearizable in general, so later ones are dropped.
    pub fn render(&self) -> String {
        let mut parts = vec![format!(
            "eq=contrast={:.3}:brightness={:.3}:saturation={:.3}:gamma={:.3}",
            self.eq.contrast, self.eq.brightness, self.eq.saturation, self.eq.gamma
        )];

        let cb = &self.colorbalance;
        if [cb.rs, cb.gs, cb.bs].iter().any(|v| v.abs() > 0.001) {
            parts.push(format!(
                "colorbalance=rs={:.3}:gs={:.3}:bs={:.3}",
                cb.rs, cb.gs, cb.bs
            ));
        }

        if let Some(curves) = self.curves.first() {
            parts.push(curves.clone());
        }

        if let Some(unsharp) = &self.unsharp {
            parts.push(format!(
                "unsharp={}:{}:{}:{}:{}:{}",
                unsharp.luma_x,
                unsharp.luma_y,
                unsharp.luma_amount,
                unsharp.chroma_x,
                unsharp.chroma_y,
                unsharp.chroma_amount
            ));
        }

        parts.join(",")
    }
}

/// Merge the fragments of the selected presets into one composite
/// filter string.
///
/// Identifiers are processed in the given order and may repeat;
/// `none` entries are skipped. An empty list, or one consisting
/// solely of `none`, short-circuits to the empty string. Callers
/// treat that as "add no video filter argument at all", not as an
/// explicit identity filter.
pub fn combine<S: AsRef<str>>(
    store: &PresetStore,
    preset_ids: &[S],
) -> Result<String, CombineError> {
    if preset_ids.iter().all(|id| id.as_ref() == NONE_PRESET) {
        return Ok(String::new());
    }

    let mut combined = CombinedFilters::default();
    for id in preset_ids {
        let id = id.as_ref();
        if id == NONE_PRESET {
            continue;
        }
        let preset = store
            .get(id)
            .ok_or_else(|| CombineError::UnknownPreset(id.to_string()))?;
        if preset.filter.is_empty() {
            continue;
        }
        for invocation in filters::parse_fragment(&preset.filter)? {
            combined.apply(invocation);
        }
    }

    Ok(combined.render())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::Preset;

    fn store_with(presets: Vec<(&str, &str)>) -> PresetStore {
        let mut all = vec![Preset {
            id: NONE_PRESET.to_string(),
            name: "No Color Correction".to_string(),
            description: String::new(),
            filter: String::new(),
        }];
        all.extend(presets.into_iter().map(|(id, filter)| Preset {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            filter: filter.to_string(),
        }));
        PresetStore::from_presets(all)
    }

    #[test]
    fn empty_selection_yields_empty_string() {
        let store = PresetStore::builtin();
        assert_eq!(combine::<&str>(&store, &[]).unwrap(), "");
        assert_eq!(combine(&store, &["none"]).unwrap(), "");
        assert_eq!(combine(&store, &["none", "none"]).unwrap(), "");
    }

    #[test]
    fn cinematic_plus_vibrant_matches_expected_fragment() {
        let store = PresetStore::builtin();
        let combined = combine(&store, &["cinematic", "vibrant"]).unwrap();
        assert_eq!(
            combined,
            "eq=contrast=1.560:brightness=0.050:saturation=1.540:gamma=1.100,\
             colorbalance=rs=-0.100:gs=0.050:bs=0.150,\
             unsharp=5:5:1.0:5:5:0.0"
        );
    }

    #[test]
    fn contrast_factors_compose_multiplicatively() {
        let store = store_with(vec![("a", "eq=contrast=1.2"), ("b", "eq=contrast=1.2")]);
        let combined = combine(&store, &["a", "b"]).unwrap();
        assert!(combined.starts_with("eq=contrast=1.440:"));
    }

    #[test]
    fn brightness_offsets_compose_additively() {
        let store = store_with(vec![
            ("a", "eq=brightness=0.05"),
            ("b", "eq=brightness=0.02"),
        ]);
        let combined = combine(&store, &["a", "b"]).unwrap();
        assert!(combined.contains("brightness=0.070"));
    }

    #[test]
    fn eq_and_colorbalance_are_order_independent() {
        let store = PresetStore::builtin();
        let forward = combine(&store, &["cinematic", "vibrant"]).unwrap();
        let reverse = combine(&store, &["vibrant", "cinematic"]).unwrap();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn adding_none_anywhere_changes_nothing() {
        let store = PresetStore::builtin();
        let plain = combine(&store, &["cinematic", "vibrant"]).unwrap();
        let padded = combine(&store, &["none", "cinematic", "none", "vibrant", "none"]).unwrap();
        assert_eq!(plain, padded);
    }

    #[test]
    fn duplicate_presets_compound() {
        let store = PresetStore::builtin();
        let doubled = combine(&store, &["vibrant", "vibrant"]).unwrap();
        // 1.3 * 1.3 = 1.69
        assert!(doubled.starts_with("eq=contrast=1.690:"));
    }

    #[test]
    fn even_kernel_sizes_are_normalized_to_odd() {
        let store = store_with(vec![("sharp", "unsharp=4:4:0.8")]);
        let combined = combine(&store, &["sharp"]).unwrap();
        assert!(combined.ends_with("unsharp=3:3:0.8:3:3:0.0"));
    }

    #[test]
    fn kernel_size_below_three_rounds_up_to_three() {
        let store = store_with(vec![("sharp", "unsharp=0:6:1.2")]);
        let combined = combine(&store, &["sharp"]).unwrap();
        assert!(combined.ends_with("unsharp=3:5:1.2:3:5:0.0"));

        // 2 would shift down to the invalid size 1; 1 is already odd
        // but still below the encoder minimum
        let store = store_with(vec![("tiny", "unsharp=2:1:0.5")]);
        let combined = combine(&store, &["tiny"]).unwrap();
        assert!(combined.ends_with("unsharp=3:3:0.5:3:3:0.0"));
    }

    #[test]
    fn strongest_unsharp_wins() {
        let store = store_with(vec![
            ("soft", "unsharp=5:5:0.5:5:5:0.0"),
            ("hard", "unsharp=7:7:1.5:7:7:0.5"),
        ]);
        let combined = combine(&store, &["soft", "hard"]).unwrap();
        assert!(combined.ends_with("unsharp=7:7:1.5:7:7:0.5"));
        // Order of selection must not matter for a strict maximum
        let reversed = combine(&store, &["hard", "soft"]).unwrap();
        assert!(reversed.ends_with("unsharp=7:7:1.5:7:7:0.5"));
    }

    #[test]
    fn equal_unsharp_strength_keeps_the_first_seen() {
        let store = store_with(vec![
            ("first", "unsharp=5:5:1.0:5:5:0.0"),
            ("second", "unsharp=9:9:1.0:9:9:0.9"),
        ]);
        let combined = combine(&store, &["first", "second"]).unwrap();
        assert!(combined.ends_with("unsharp=5:5:1.0:5:5:0.0"));
    }

    #[test]
    fn unsharp_amounts_are_emitted_verbatim() {
        let store = store_with(vec![("sharp", "unsharp=5:5:1.25:5:5:0.75")]);
        let combined = combine(&store, &["sharp"]).unwrap();
        assert!(combined.ends_with("unsharp=5:5:1.25:5:5:0.75"));
    }

    #[test]
    fn first_curves_fragment_wins() {
        let store = store_with(vec![
            ("teal", "curves=blue='0/0 0.5/0.58 1/1'"),
            ("light", "curves=preset=lighter"),
        ]);
        let combined = combine(&store, &["teal", "light"]).unwrap();
        assert!(combined.contains("curves=blue='0/0 0.5/0.58 1/1'"));
        assert!(!combined.contains("curves=preset=lighter"));
    }

    #[test]
    fn near_zero_colorbalance_is_suppressed() {
        let store = store_with(vec![("subtle", "colorbalance=rs=0.0005")]);
        let combined = combine(&store, &["subtle"]).unwrap();
        assert!(!combined.contains("colorbalance"));
    }

    #[test]
    fn cancelling_colorbalance_shifts_are_suppressed() {
        let store = store_with(vec![
            ("warm", "colorbalance=rs=0.1"),
            ("cool", "colorbalance=rs=-0.1"),
        ]);
        let combined = combine(&store, &["warm", "cool"]).unwrap();
        assert!(!combined.contains("colorbalance"));
    }

    #[test]
    fn emitted_terms_follow_the_fixed_order() {
        let store = store_with(vec![(
            "all",
            "unsharp=5:5:1.0,curves=preset=lighter,colorbalance=rs=0.1,eq=contrast=1.1",
        )]);
        let combined = combine(&store, &["all"]).unwrap();
        let eq = combined.find("eq=").unwrap();
        let cb = combined.find("colorbalance=").unwrap();
        let curves = combined.find("curves=").unwrap();
        let unsharp = combined.find("unsharp=").unwrap();
        assert!(eq < cb && cb < curves && curves < unsharp);
    }

    #[test]
    fn identity_eq_is_always_emitted_for_real_presets() {
        let store = store_with(vec![("curveonly", "curves=preset=lighter")]);
        let combined = combine(&store, &["curveonly"]).unwrap();
        assert!(combined.starts_with(
            "eq=contrast=1.000:brightness=0.000:saturation=1.000:gamma=1.000"
        ));
    }

    #[test]
    fn unknown_invocations_are_dropped_silently() {
        let store = store_with(vec![("odd", "vignette=PI/4,eq=contrast=1.2")]);
        let combined = combine(&store, &["odd"]).unwrap();
        assert!(!combined.contains("vignette"));
        assert!(combined.starts_with("eq=contrast=1.200:"));
    }

    #[test]
    fn unknown_preset_id_is_an_error() {
        let store = PresetStore::builtin();
        assert!(matches!(
            combine(&store, &["dramatic"]),
            Err(CombineError::UnknownPreset(_))
        ));
    }

    #[test]
    fn malformed_preset_fragment_propagates() {
        let store = store_with(vec![("broken", "eq=contrast=bold")]);
        assert!(matches!(
            combine(&store, &["broken"]),
            Err(CombineError::Parse(_))
        ));
    }
}

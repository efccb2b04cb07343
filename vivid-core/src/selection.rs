use crate::presets::{NONE_PRESET, PresetStore};

/// Resolve a user selection string into preset ids.
///
/// The input is a 1-based index, or a comma-separated list of 1-based
/// indices, into the store's declaration order. Out-of-range indices
/// are discarded without error; in a multi-selection the `none` entry
/// is skipped. Unparsable input, or a selection with no surviving
/// entries, degrades to `["none"]`. A single selection that lands on
/// `none` returns `["none"]` explicitly.
pub fn resolve_selection(input: &str, store: &PresetStore) -> Vec<String> {
    let input = input.trim();
    let ids: Vec<&str> = store.ids().collect();

    if input.contains(',') {
        let mut choices = Vec::new();
        for token in input.split(',') {
            match token.trim().parse::<i64>() {
                Ok(index) => choices.push(index),
                Err(_) => return vec![NONE_PRESET.to_string()],
            }
        }

        let mut selected = Vec::new();
        for index in choices {
            if index >= 1 && (index as usize) <= ids.len() {
                let id = ids[index as usize - 1];
                if id != NONE_PRESET {
                    selected.push(id.to_string());
                }
            }
        }

        if selected.is_empty() {
            vec![NONE_PRESET.to_string()]
        } else {
            selected
        }
    } else {
        match input.parse::<i64>() {
            Ok(index) if index >= 1 && (index as usize) <= ids.len() => {
                vec![ids[index as usize - 1].to_string()]
            }
            _ => vec![NONE_PRESET.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::Preset;

    fn store_of(ids: &[&str]) -> PresetStore {
        PresetStore::from_presets(
            ids.iter()
                .map(|id| Preset {
                    id: id.to_string(),
                    name: id.to_string(),
                    description: String::new(),
                    filter: String::new(),
                })
                .collect(),
        )
    }

    #[test]
    fn single_index_resolves_to_one_id() {
        let store = store_of(&["none", "cinematic", "vibrant"]);
        assert_eq!(resolve_selection("2", &store), vec!["cinematic"]);
    }

    #[test]
    fn single_index_may_resolve_to_none() {
        let store = store_of(&["none", "cinematic", "vibrant"]);
        assert_eq!(resolve_selection("1", &store), vec!["none"]);
    }

    #[test]
    fn out_of_range_indices_are_discarded() {
        let store = store_of(&["none", "a", "b", "c", "d", "e", "f"]);
        assert_eq!(resolve_selection("2,8,6", &store), vec!["a", "e"]);
    }

    #[test]
    fn multi_selection_preserves_input_order() {
        let store = store_of(&["none", "a", "b", "c"]);
        assert_eq!(resolve_selection("4,2", &store), vec!["c", "a"]);
    }

    #[test]
    fn none_is_skipped_inside_multi_selection() {
        let store = store_of(&["none", "a", "b"]);
        assert_eq!(resolve_selection("1,3", &store), vec!["b"]);
    }

    #[test]
    fn fully_invalid_multi_selection_degrades_to_none() {
        let store = store_of(&["none", "a", "b"]);
        assert_eq!(resolve_selection("9,12", &store), vec!["none"]);
        assert_eq!(resolve_selection("x,2", &store), vec!["none"]);
    }

    #[test]
    fn garbage_input_degrades_to_none() {
        let store = store_of(&["none", "a"]);
        assert_eq!(resolve_selection("all of them", &store), vec!["none"]);
        assert_eq!(resolve_selection("0", &store), vec!["none"]);
        assert_eq!(resolve_selection("-2", &store), vec!["none"]);
        assert_eq!(resolve_selection("", &store), vec!["none"]);
    }

    #[test]
    fn duplicate_indices_are_kept() {
        let store = store_of(&["none", "a"]);
        assert_eq!(resolve_selection("2,2", &store), vec!["a", "a"]);
    }
}

use crate::lexicon::Lexicon;

/// Exact membership of a normalized candidate in the combined name lists.
/// Misspelled names are not caught here.
pub fn is_person_name(candidate: &str, lexicon: &Lexicon) -> bool {
    lexicon.is_name(candidate)
}

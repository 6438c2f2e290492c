/// Records that may be restricted to a set of country codes.
///
/// An absent or empty list means the record applies everywhere.
pub trait Regional {
    fn countries(&self) -> Option<&[String]>;

    fn available_in(&self, code: &str) -> bool {
        match self.countries() {
            None => true,
            Some([]) => true,
            Some(list) => list.iter().any(|c| c.eq_ignore_ascii_case(code.trim())),
        }
    }
}

/// Keeps the items of `items` that apply to `code`.
pub fn filter_for_country<T: Regional>(items: Vec<T>, code: &str) -> Vec<T> {
    items.into_iter().filter(|i| i.available_in(code)).collect()
}

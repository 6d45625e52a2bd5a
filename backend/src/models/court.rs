use crate::define_name_type;

define_name_type!(Court);

/// The closed set of courts known for a run.
///
/// Raw court identifiers coming from a source are resolved against this set;
/// anything that does not resolve is rejected by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtSet {
    courts: Vec<Court>,
}

impl CourtSet {
    pub fn new(courts: Vec<Court>) -> Self {
        Self { courts }
    }

    /// Resolve a raw identifier: exact match after trimming first, then a
    /// case-insensitive match.
    pub fn resolve(&self, raw: &str) -> Option<&Court> {
        let trimmed = raw.trim();
        self.courts
            .iter()
            .find(|c| c.as_str() == trimmed)
            .or_else(|| {
                self.courts
                    .iter()
                    .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            })
    }

    pub fn contains(&self, court: &Court) -> bool {
        self.courts.contains(court)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Court> {
        self.courts.iter()
    }

    pub fn len(&self) -> usize {
        self.courts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courts.is_empty()
    }
}

impl FromIterator<Court> for CourtSet {
    fn from_iter<I: IntoIterator<Item = Court>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

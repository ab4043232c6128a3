use std::{collections::HashSet, fmt};

use twilight_model::id::{
    Id,
    marker::{GuildMarker, UserMarker},
};

/// Registry key for a kick session: one guild, one session.
pub type ScopeKey = Id<GuildMarker>;

/// A guild member selected for removal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub id: Id<UserMarker>,
    pub display_name: String,
}

impl Target {
    pub fn new(id: Id<UserMarker>, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (id: {})", self.display_name, self.id.get())
    }
}

/// Drop repeated member ids, keeping the first occurrence and original order.
pub(crate) fn dedup_targets(targets: Vec<Target>) -> Vec<Target> {
    let mut seen = HashSet::with_capacity(targets.len());
    targets
        .into_iter()
        .filter(|target| seen.insert(target.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_order() {
        let targets = vec![
            Target::new(Id::new(3), "c"),
            Target::new(Id::new(1), "a"),
            Target::new(Id::new(3), "c again"),
            Target::new(Id::new(2), "b"),
        ];

        let ids: Vec<u64> = dedup_targets(targets)
            .iter()
            .map(|target| target.id.get())
            .collect();

        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn display_includes_name_and_id() {
        let target = Target::new(Id::new(42), "Ferris");
        assert_eq!(target.to_string(), "Ferris (id: 42)");
    }
}

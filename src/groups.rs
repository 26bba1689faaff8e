//! Recognized LINE groups.
//!
//! Every group the bot serves is "recognized". The regional groups are the
//! subset whose members may register as catchers.

/// A LINE group known to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The fixed group table, with the regional subset marked.
///
/// Lookups walk groups in table order, so "first group the user belongs to"
/// is deterministic.
#[derive(Debug, Clone)]
pub struct GroupDirectory {
    recognized: Vec<Group>,
    regional: Vec<Group>,
}

const REGIONAL_GROUPS: &[(&str, &str)] = &[
    ("Cb6cfd28af50d41e8dd69b83efa7a5d26", "北一群"),
    ("Cc36a07572245c408431d11bd7fd94a45", "北二群"),
    ("C70b22d41c71fbccd1f557f6010f1d3e5", "中區群"),
    ("Cff9579c1947754d35387850add5c437e", "南區群"),
];

const GENERAL_GROUPS: &[(&str, &str)] = &[
    ("C193b9f94b6774670be047cf22575d99f", "大一群"),
    ("C1ee14832848258d925ab801cb91fd76e", "大二群"),
    ("C9fff1abaab5eddda37095a31b11b9335", "大三群"),
];

impl GroupDirectory {
    /// Build a directory. Regional groups are added to the recognized set if
    /// they are not already in it.
    pub fn new(general: Vec<Group>, regional: Vec<Group>) -> Self {
        let mut recognized = general;
        for group in &regional {
            if !recognized.iter().any(|g| g.id == group.id) {
                recognized.push(group.clone());
            }
        }
        Self {
            recognized,
            regional,
        }
    }

    /// Groups whose members may register.
    pub fn regional(&self) -> &[Group] {
        &self.regional
    }

    /// Every group the bot answers in.
    pub fn recognized(&self) -> &[Group] {
        &self.recognized
    }

    pub fn is_recognized(&self, group_id: &str) -> bool {
        self.recognized.iter().any(|g| g.id == group_id)
    }
}

impl Default for GroupDirectory {
    fn default() -> Self {
        let to_groups = |table: &[(&str, &str)]| {
            table
                .iter()
                .map(|(id, name)| Group::new(*id, *name))
                .collect::<Vec<_>>()
        };
        Self::new(to_groups(GENERAL_GROUPS), to_groups(REGIONAL_GROUPS))
    }
}

//! Deploy directory actions (`auto.deploy.action`)

use std::fmt;

/// An action the directory planner may take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Update,
    Uninstall,
    Start,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Install,
        Action::Update,
        Action::Uninstall,
        Action::Start,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Install => "install",
            Action::Update => "update",
            Action::Uninstall => "uninstall",
            Action::Start => "start",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Action::Install => 1,
            Action::Update => 1 << 1,
            Action::Uninstall => 1 << 2,
            Action::Start => 1 << 3,
        }
    }
}

/// Set of enabled directory actions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSet(u8);

impl ActionSet {
    /// Parse a comma-separated action list.
    ///
    /// Tokens are trimmed and matched case-insensitively; unknown tokens are
    /// dropped.
    pub fn parse(value: &str) -> Self {
        let mut set = ActionSet::default();
        for token in value.split(',') {
            let token = token.trim();
            if let Some(action) = Action::ALL
                .into_iter()
                .find(|action| action.as_str().eq_ignore_ascii_case(token))
            {
                set = set.with(action);
            }
        }
        set
    }

    #[must_use]
    pub fn with(self, action: Action) -> Self {
        Self(self.0 | action.bit())
    }

    pub fn contains(self, action: Action) -> bool {
        self.0 & action.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Action::ALL
            .into_iter()
            .filter(|action| self.contains(*action))
            .map(Action::as_str)
            .collect();
        f.write_str(&names.join(","))
    }
}

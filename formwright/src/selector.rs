use crate::matcher::{exact_pattern, MatchPattern};

/// Represents ways to locate a UI element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Select by ARIA role and optional accessible-name pattern
    Role {
        role: String,
        name: Option<MatchPattern>,
    },
    /// Chain multiple selectors, each scoped to the matches of the previous one
    Chain(Vec<Selector>),
    /// Represents an invalid selector string, with a reason.
    Invalid(String),
}

impl Selector {
    pub fn role(role: &str) -> Self {
        Selector::Role {
            role: role.to_string(),
            name: None,
        }
    }

    pub fn role_named(role: &str, name: MatchPattern) -> Self {
        Selector::Role {
            role: role.to_string(),
            name: Some(name),
        }
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Selector::Role { role, name: None } => write!(f, "role:{role}"),
            Selector::Role {
                role,
                name: Some(name),
            } => write!(f, "role:{role}|name:{name}"),
            Selector::Chain(parts) => {
                let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", parts.join(" >> "))
            }
            Selector::Invalid(reason) => write!(f, "invalid({reason})"),
        }
    }
}

fn named(kind: &str, raw: &str) -> Result<MatchPattern, Selector> {
    exact_pattern(raw).map_err(|e| Selector::Invalid(format!("bad {kind} '{raw}': {e}")))
}

impl From<&str> for Selector {
    fn from(s: &str) -> Self {
        // Handle chained selectors first
        let parts: Vec<&str> = s.split(">>").map(|p| p.trim()).collect();
        if parts.len() > 1 {
            return Selector::Chain(parts.into_iter().map(Selector::from).collect());
        }

        let s = s.trim();

        // role|name is the precise form, e.g. "role:combobox|name:Account"
        if let Some((role_part, name_part)) = s.split_once('|') {
            let role = role_part.trim();
            let role = role.strip_prefix("role:").unwrap_or(role).to_string();
            let name = name_part.trim();
            let name = name.strip_prefix("name:").unwrap_or(name);
            return match named("name", name) {
                Ok(pattern) => Selector::Role {
                    role,
                    name: Some(pattern),
                },
                Err(invalid) => invalid,
            };
        }

        match s {
            _ if s.starts_with("role:") => Selector::Role {
                role: s["role:".len()..].to_string(),
                name: None,
            },
            "textbox" | "combobox" | "listbox" | "option" | "dialog" | "grid" | "row"
            | "gridcell" | "checkbox" | "switch" | "button" | "heading" | "searchbox" => {
                Selector::role(s)
            }
            _ => Selector::Invalid(format!(
                "Unknown selector format: \"{s}\". Use 'role:' or 'role:x|name:y', chained with '>>'."
            )),
        }
    }
}

impl From<String> for Selector {
    fn from(s: String) -> Self {
        Selector::from(s.as_str())
    }
}

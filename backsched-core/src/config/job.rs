use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf, time::Duration};

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Name(pub String);

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a secret across all commands and jobs of a single run.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretId(pub String);

impl std::fmt::Display for SecretId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Command {
    /// Full path to the executable.
    pub cmd: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    // plain values have to come before the env tables when serializing to TOML
    /// Working directory; defaults to the current directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workdir: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Environment variables whose value is a secret resolved at run time.
    #[serde(default, alias = "secret_env")]
    pub secret_env: BTreeMap<String, SecretId>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize)]
#[serde(untagged, deny_unknown_fields)]
pub enum Requirement {
    DirectoryExists { path: PathBuf },
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Definition {
    pub name: Name,
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    #[serde(default)]
    pub requires: Vec<Requirement>,
    pub commands: Vec<Command>,
}

impl Definition {
    pub fn secret_ids(&self) -> impl Iterator<Item = &SecretId> {
        self.commands
            .iter()
            .flat_map(|command| command.secret_env.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;

    #[test]
    fn should_parse_requirement_from_path_table() {
        let requirement: Requirement = toml::from_str(r#"path = "/mnt/backup""#).unwrap();

        assert_eq!(
            requirement,
            Requirement::DirectoryExists {
                path: PathBuf::from("/mnt/backup")
            }
        );
    }

    #[test]
    fn should_not_parse_requirement_with_unknown_key() {
        let result = toml::from_str::<Requirement>(r#"file = "/mnt/backup""#);

        assert!(result.is_err());
    }

    #[test]
    fn should_list_secret_ids_of_all_commands_in_order() {
        let definition = Definition {
            commands: vec![
                Command {
                    secret_env: btreemap! {
                        "B_PASSWORD".to_owned() => SecretId("b".to_owned()),
                        "A_PASSWORD".to_owned() => SecretId("a".to_owned()),
                    },
                    ..Default::default()
                },
                Command::default(),
                Command {
                    secret_env: btreemap! {
                        "PASSWORD".to_owned() => SecretId("a".to_owned()),
                    },
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let ids = definition
            .secret_ids()
            .map(|id| id.0.as_str())
            .collect::<Vec<_>>();

        assert_eq!(ids, vec!["a", "b", "a"]);
    }
}

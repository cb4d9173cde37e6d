//! Create-instance wizard state
//!
//! Wraps a three-field [`FieldChain`] (software, game version, loader/build)
//! plus the free-text name and jar-path inputs. The chain decides what to
//! fetch; this module decides which backend call satisfies each directive and
//! what a submittable wizard looks like.

use cwarden_core::types::SoftwareKind;
use cwarden_gateway::BackendCommand;

use crate::chain::{FetchDirective, FieldChain, FieldDef, FieldPlan};

/// Chain index of the software dropdown
pub const SOFTWARE_FIELD: usize = 0;
/// Chain index of the game version dropdown
pub const VERSION_FIELD: usize = 1;
/// Chain index of the loader/build dropdown
pub const LOADER_FIELD: usize = 2;

fn software_plan(_upstream: &[Option<String>]) -> FieldPlan {
    FieldPlan::Static(
        SoftwareKind::ALL
            .iter()
            .map(|k| k.as_str().to_string())
            .collect(),
    )
}

fn version_plan(upstream: &[Option<String>]) -> FieldPlan {
    match upstream[0].as_deref().and_then(SoftwareKind::parse) {
        None => FieldPlan::Inactive,
        // Custom instances run a user-supplied jar; there is no version list.
        Some(SoftwareKind::Custom) => FieldPlan::Inactive,
        Some(_) => FieldPlan::Fetch,
    }
}

fn loader_plan(upstream: &[Option<String>]) -> FieldPlan {
    let software = upstream[0].as_deref().and_then(SoftwareKind::parse);
    match software {
        // Fabric's loader list does not depend on the game version
        Some(SoftwareKind::Fabric) => FieldPlan::Fetch,
        Some(SoftwareKind::Forge) | Some(SoftwareKind::NeoForge) => match upstream[1].as_deref() {
            Some(_) => FieldPlan::Fetch,
            None => FieldPlan::Inactive,
        },
        _ => FieldPlan::Inactive,
    }
}

/// State of the create-instance dialog.
#[derive(Debug, Clone)]
pub struct CreateWizard {
    pub chain: FieldChain,
    pub name: String,
    pub custom_jar_path: String,
    /// True while the create call is in flight
    pub submitting: bool,
    /// Last submit failure, shown inline
    pub error: Option<String>,
}

impl CreateWizard {
    pub fn new() -> (Self, Vec<FetchDirective>) {
        let (chain, directives) = FieldChain::new(vec![
            FieldDef {
                key: "software",
                plan: software_plan,
            },
            FieldDef {
                key: "version",
                plan: version_plan,
            },
            FieldDef {
                key: "loader",
                plan: loader_plan,
            },
        ]);

        let wizard = Self {
            chain,
            name: String::new(),
            custom_jar_path: String::new(),
            submitting: false,
            error: None,
        };
        (wizard, directives)
    }

    /// Chosen software family, once one is selected.
    pub fn software(&self) -> Option<SoftwareKind> {
        self.chain
            .value_of("software")
            .and_then(SoftwareKind::parse)
    }

    fn is_custom(&self) -> bool {
        self.software() == Some(SoftwareKind::Custom)
    }

    /// Choose a value for one chain field, cascading downstream.
    pub fn select(&mut self, index: usize, value: impl Into<String>) -> Vec<FetchDirective> {
        self.error = None;
        self.chain.select(index, value)
    }

    /// Apply an options resolution; stale generations are dropped.
    pub fn resolve(
        &mut self,
        index: usize,
        generation: u64,
        result: Result<Vec<String>, String>,
    ) -> bool {
        self.chain.resolve(index, generation, result)
    }

    /// Backend call that satisfies one fetch directive.
    ///
    /// Returns `None` when the directive's upstream no longer names a
    /// fetchable combination, in which case nothing should be sent.
    pub fn fetch_command(directive: &FetchDirective) -> Option<BackendCommand> {
        let software = directive
            .upstream
            .first()?
            .as_deref()
            .and_then(SoftwareKind::parse)?;

        match directive.key {
            "version" => match software {
                SoftwareKind::Vanilla => Some(BackendCommand::VanillaVersions),
                SoftwareKind::PaperMc => Some(BackendCommand::PaperVersions),
                SoftwareKind::Purpur => Some(BackendCommand::PurpurVersions),
                SoftwareKind::Fabric => Some(BackendCommand::FabricGameVersions),
                SoftwareKind::Forge => Some(BackendCommand::ForgeMcVersions),
                SoftwareKind::NeoForge => Some(BackendCommand::NeoforgeMcVersions),
                SoftwareKind::Custom => None,
            },
            "loader" => match software {
                SoftwareKind::Fabric => Some(BackendCommand::FabricLoaderVersions),
                SoftwareKind::Forge => {
                    let mc_version = directive.upstream.get(1)?.clone()?;
                    Some(BackendCommand::ForgeVersions { mc_version })
                }
                SoftwareKind::NeoForge => {
                    let mc_version = directive.upstream.get(1)?.clone()?;
                    Some(BackendCommand::NeoforgeVersions { mc_version })
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Check whether the wizard can be submitted.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Instance name is required".to_string());
        }
        let Some(software) = self.software() else {
            return Err("Select a server software".to_string());
        };
        if software.is_manual() && self.custom_jar_path.trim().is_empty() {
            return Err("A server jar path is required for custom instances".to_string());
        }
        if self.chain.fields().iter().any(|f| f.is_loading()) {
            return Err("Version lists are still loading".to_string());
        }
        if !self.chain.is_complete() {
            return Err("Complete every version selection".to_string());
        }
        Ok(())
    }

    /// Build the create call from the current selections.
    ///
    /// Assumes `validate` passed; returns `None` if it could not have.
    pub fn create_command(&self) -> Option<BackendCommand> {
        let software = self.software()?;
        let version = match self.chain.value_of("version") {
            Some(v) => v.to_string(),
            // No version list for manual jars; the backend records a marker
            None if software.is_manual() => "custom".to_string(),
            None => return None,
        };
        let loader = self
            .chain
            .field(LOADER_FIELD)
            .filter(|f| f.is_active())
            .and_then(|f| f.value())
            .map(str::to_string);
        let custom_jar_path = software
            .is_manual()
            .then(|| self.custom_jar_path.trim().to_string());

        Some(BackendCommand::CreateInstance {
            name: self.name.trim().to_string(),
            software: software.as_str().to_string(),
            version,
            loader,
            custom_jar_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve_all(wizard: &mut CreateWizard, directives: &[FetchDirective], options: &[&str]) {
        for d in directives {
            wizard.resolve(
                d.index,
                d.generation,
                Ok(options.iter().map(|s| s.to_string()).collect()),
            );
        }
    }

    #[test]
    fn test_new_wizard_offers_all_software() {
        let (wizard, directives) = CreateWizard::new();
        assert!(directives.is_empty());

        let software = wizard.chain.field(SOFTWARE_FIELD).unwrap();
        assert_eq!(software.options().len(), SoftwareKind::ALL.len());
        assert!(!wizard.chain.field(VERSION_FIELD).unwrap().is_active());
        assert!(!wizard.chain.field(LOADER_FIELD).unwrap().is_active());
    }

    #[test]
    fn test_vanilla_fetches_versions_only() {
        let (mut wizard, _) = CreateWizard::new();
        let directives = wizard.select(SOFTWARE_FIELD, "vanilla");

        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].key, "version");
        assert_eq!(
            CreateWizard::fetch_command(&directives[0]),
            Some(BackendCommand::VanillaVersions)
        );
        assert!(!wizard.chain.field(LOADER_FIELD).unwrap().is_active());
    }

    #[test]
    fn test_fabric_fetches_versions_and_loaders_at_once() {
        let (mut wizard, _) = CreateWizard::new();
        let directives = wizard.select(SOFTWARE_FIELD, "fabric");

        let keys: Vec<&str> = directives.iter().map(|d| d.key).collect();
        assert_eq!(keys, vec!["version", "loader"]);
        assert_eq!(
            CreateWizard::fetch_command(&directives[0]),
            Some(BackendCommand::FabricGameVersions)
        );
        assert_eq!(
            CreateWizard::fetch_command(&directives[1]),
            Some(BackendCommand::FabricLoaderVersions)
        );
    }

    #[test]
    fn test_forge_loader_waits_for_version() {
        let (mut wizard, _) = CreateWizard::new();
        let directives = wizard.select(SOFTWARE_FIELD, "forge");

        assert_eq!(directives.len(), 1);
        assert_eq!(
            CreateWizard::fetch_command(&directives[0]),
            Some(BackendCommand::ForgeMcVersions)
        );
        assert!(!wizard.chain.field(LOADER_FIELD).unwrap().is_active());

        resolve_all(&mut wizard, &directives, &["1.20.4", "1.20.1"]);
        let directives = wizard.select(VERSION_FIELD, "1.20.4");

        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].key, "loader");
        assert_eq!(
            CreateWizard::fetch_command(&directives[0]),
            Some(BackendCommand::ForgeVersions {
                mc_version: "1.20.4".to_string()
            })
        );
    }

    #[test]
    fn test_neoforge_loader_carries_game_version() {
        let (mut wizard, _) = CreateWizard::new();
        let d = wizard.select(SOFTWARE_FIELD, "neoforge");
        resolve_all(&mut wizard, &d, &["1.21"]);
        let d = wizard.select(VERSION_FIELD, "1.21");

        assert_eq!(
            CreateWizard::fetch_command(&d[0]),
            Some(BackendCommand::NeoforgeVersions {
                mc_version: "1.21".to_string()
            })
        );
    }

    #[test]
    fn test_switching_software_clears_chosen_version_and_replans() {
        let (mut wizard, _) = CreateWizard::new();
        let d = wizard.select(SOFTWARE_FIELD, "vanilla");
        resolve_all(&mut wizard, &d, &["1.20.4", "1.20.1"]);
        wizard.select(VERSION_FIELD, "1.20.4");
        assert_eq!(
            wizard.chain.field(VERSION_FIELD).unwrap().value(),
            Some("1.20.4")
        );

        let directives = wizard.select(SOFTWARE_FIELD, "fabric");

        let version = wizard.chain.field(VERSION_FIELD).unwrap();
        assert!(version.value().is_none());
        assert!(version.options().is_empty());
        assert!(version.is_loading());
        assert!(wizard.chain.field(LOADER_FIELD).unwrap().value().is_none());

        let keys: Vec<&str> = directives.iter().map(|d| d.key).collect();
        assert_eq!(keys, vec!["version", "loader"]);
        assert_eq!(
            CreateWizard::fetch_command(&directives[0]),
            Some(BackendCommand::FabricGameVersions)
        );
    }

    #[test]
    fn test_switching_software_discards_stale_versions() {
        let (mut wizard, _) = CreateWizard::new();
        let first = wizard.select(SOFTWARE_FIELD, "vanilla");
        let second = wizard.select(SOFTWARE_FIELD, "papermc");

        // The vanilla list resolves after the switch and must not land.
        assert!(!wizard.resolve(
            first[0].index,
            first[0].generation,
            Ok(vec!["1.8.9".to_string()])
        ));
        assert!(wizard
            .chain
            .field(VERSION_FIELD)
            .unwrap()
            .options()
            .is_empty());

        assert!(wizard.resolve(
            second[0].index,
            second[0].generation,
            Ok(vec!["1.20.4".to_string()])
        ));
        assert_eq!(
            wizard.chain.field(VERSION_FIELD).unwrap().options(),
            ["1.20.4"]
        );
    }

    #[test]
    fn test_custom_software_disables_version_chain() {
        let (mut wizard, _) = CreateWizard::new();
        let directives = wizard.select(SOFTWARE_FIELD, "custom");

        assert!(directives.is_empty());
        assert!(!wizard.chain.field(VERSION_FIELD).unwrap().is_active());
        assert!(!wizard.chain.field(LOADER_FIELD).unwrap().is_active());
    }

    #[test]
    fn test_validate_requires_name() {
        let (mut wizard, _) = CreateWizard::new();
        let d = wizard.select(SOFTWARE_FIELD, "vanilla");
        resolve_all(&mut wizard, &d, &["1.20.4"]);
        wizard.select(VERSION_FIELD, "1.20.4");

        assert!(wizard.validate().is_err());
        wizard.name = "lobby".to_string();
        assert!(wizard.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_loading_chain() {
        let (mut wizard, _) = CreateWizard::new();
        wizard.name = "lobby".to_string();
        wizard.select(SOFTWARE_FIELD, "vanilla");

        let err = wizard.validate().unwrap_err();
        assert!(err.contains("loading"));
    }

    #[test]
    fn test_validate_custom_requires_jar_path() {
        let (mut wizard, _) = CreateWizard::new();
        wizard.name = "modded".to_string();
        wizard.select(SOFTWARE_FIELD, "custom");

        assert!(wizard.validate().is_err());
        wizard.custom_jar_path = "/srv/jars/server.jar".to_string();
        assert!(wizard.validate().is_ok());
    }

    #[test]
    fn test_create_command_for_fabric() {
        let (mut wizard, _) = CreateWizard::new();
        wizard.name = "skyblock".to_string();
        let d = wizard.select(SOFTWARE_FIELD, "fabric");
        resolve_all(&mut wizard, &d, &["1.20.4"]);
        wizard.select(VERSION_FIELD, "1.20.4");
        let loader_field = wizard.chain.field(LOADER_FIELD).unwrap();
        let gen = loader_field.generation();
        wizard.resolve(LOADER_FIELD, gen, Ok(vec!["0.15.6".to_string()]));
        wizard.select(LOADER_FIELD, "0.15.6");

        assert_eq!(
            wizard.create_command(),
            Some(BackendCommand::CreateInstance {
                name: "skyblock".to_string(),
                software: "fabric".to_string(),
                version: "1.20.4".to_string(),
                loader: Some("0.15.6".to_string()),
                custom_jar_path: None,
            })
        );
    }

    #[test]
    fn test_create_command_for_custom_jar() {
        let (mut wizard, _) = CreateWizard::new();
        wizard.name = "legacy".to_string();
        wizard.custom_jar_path = " /srv/jars/old.jar ".to_string();
        wizard.select(SOFTWARE_FIELD, "custom");

        assert_eq!(
            wizard.create_command(),
            Some(BackendCommand::CreateInstance {
                name: "legacy".to_string(),
                software: "custom".to_string(),
                version: "custom".to_string(),
                loader: None,
                custom_jar_path: Some("/srv/jars/old.jar".to_string()),
            })
        );
    }
}

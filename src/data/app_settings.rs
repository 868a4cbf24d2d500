use crate::data::persistence::{get_data_dir, Persistable};
use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AppSettings {
    /// Name of the grid container; also the prefix of every cell id.
    #[serde(default = "default_target")]
    pub target: String,
    /// Id of the control that opens the add-record form.
    #[serde(default = "default_add_form_control")]
    pub add_form_control: String,
}

fn default_target() -> String {
    "table".to_string()
}

fn default_add_form_control() -> String {
    "ds_add".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            target: default_target(),
            add_form_control: default_add_form_control(),
        }
    }
}

/// Wrapper that reads the `settings` key from config.yaml.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: AppSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

impl AppSettings {
    pub fn load() -> Result<Self> {
        Self::load_from(&get_data_dir()?)
    }

    pub fn save_to(&self, dir: &std::path::Path) -> Result<()> {
        let wrapper = SettingsWrapper {
            settings: self.clone(),
        };
        wrapper.save_to(dir)
    }

    pub fn load_from(dir: &std::path::Path) -> Result<Self> {
        Ok(SettingsWrapper::load_from(dir)?.settings)
    }
}

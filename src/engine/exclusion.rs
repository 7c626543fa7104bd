//! 字段排除规则
//!
//! 系统字段与各内容类型配置的排除字段合并为一个集合，
//! 命中的字段在翻译时原样保留。

use std::collections::HashSet;

use crate::config::constants;
use crate::settings::PluginSettings;

/// 字段排除集合
#[derive(Debug, Clone, Default)]
pub struct FieldExclusionSet {
    fields: HashSet<String>,
}

impl FieldExclusionSet {
    /// 仅含系统字段的基础集合
    pub fn system_only() -> Self {
        let mut set = Self::default();
        set.extend_system_fields();
        set
    }

    /// 由设置快照构造指定内容类型的完整排除集合
    pub fn from_settings(settings: &PluginSettings, model: &str) -> Self {
        let mut set = Self::system_only();
        for field in settings.content_type(model).ignored_fields {
            set.fields.insert(field);
        }
        set
    }

    fn extend_system_fields(&mut self) {
        for field in constants::SYSTEM_FIELDS {
            self.fields.insert((*field).to_string());
        }
    }

    /// 添加额外的排除字段
    pub fn insert(&mut self, field: impl Into<String>) {
        self.fields.insert(field.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }
}

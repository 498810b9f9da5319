//! Intermediate representation shared by the pipeline stages.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

/// Input to one compile call. Borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct ComponentSource<'a> {
    pub path: &'a str,
    pub text: &'a str,
}

impl<'a> ComponentSource<'a> {
    pub fn new(path: &'a str, text: &'a str) -> Self {
        Self { path, text }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentKind {
    Ephemeral,
    Persistent,
}

impl ComponentKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "ephemeral" => Some(ComponentKind::Ephemeral),
            "persistent" => Some(ComponentKind::Persistent),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            ComponentKind::Ephemeral => "ephemeral",
            ComponentKind::Persistent => "persistent",
        }
    }

    /// Runtime base class the generated component extends.
    pub fn base_class(self) -> &'static str {
        match self {
            ComponentKind::Ephemeral => "Component",
            ComponentKind::Persistent => "PersistentComponent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHeader {
    pub kind: ComponentKind,
    pub name: String,
    pub raw_parameter_list: String,
    /// Byte offset just past the header's opening `{`.
    pub body_start_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentBody {
    pub prelude: String,
    pub render_argument: String,
    /// Byte offset of the `render` token in the source.
    pub render_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MarkupNode {
    Text {
        content: String,
    },
    Interpolation {
        name: String,
    },
    Conditional {
        condition: String,
        body: Vec<MarkupNode>,
        /// `@else { ... }` branch; empty when absent.
        #[serde(default)]
        alternate: Vec<MarkupNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct GeneratedModule {
    pub code: String,
    #[serde(default, rename = "map", skip_serializing_if = "Option::is_none")]
    pub source_map: Option<String>,
}

//! The deployment descriptor object model.
//!
//! Every type is a [`BeanType`] registered under a `webapp.*` name by
//! [`register_classes`](crate::register_classes). Children are added to their
//! parents by value when their element closes, so a finished [`WebApp`] is a
//! plain owned tree.

use std::collections::BTreeMap;

use serde::Serialize;
use trellis::{Bean, BeanType};

/// Capability name implemented by [`WebApp`]; the set-distributable and public-id
/// rules target it.
pub const CONTEXT_TYPE: &str = "webapp.Context";

/// Capability name implemented by [`Servlet`]; `addChild` accepts it.
pub const CONTAINER_TYPE: &str = "webapp.Container";

/// Valid `<dispatcher>` values.
pub const DISPATCHERS: [&str; 4] = ["REQUEST", "FORWARD", "INCLUDE", "ERROR"];

// ═══════════════════════════════════════════════════════════════════════════════
// Application
// ═══════════════════════════════════════════════════════════════════════════════

/// A web application, populated from its `web.xml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WebApp {
    pub public_id: Option<String>,
    pub display_name: Option<String>,
    pub distributable: bool,
    /// Context initialization parameters.
    pub parameters: BTreeMap<String, String>,
    pub filter_defs: Vec<FilterDef>,
    pub filter_maps: Vec<FilterMap>,
    pub error_pages: Vec<ErrorPage>,
    pub application_listeners: Vec<String>,
    pub jsp_mappings: Vec<String>,
    pub login_config: Option<LoginConfig>,
    /// Extension → MIME type.
    pub mime_mappings: BTreeMap<String, String>,
    pub message_destinations: Vec<MessageDestination>,
    pub message_destination_refs: Vec<MessageDestinationRef>,
    pub constraints: Vec<SecurityConstraint>,
    pub security_roles: Vec<String>,
    pub servlets: Vec<Servlet>,
    /// URL pattern → servlet name.
    pub servlet_mappings: BTreeMap<String, String>,
    /// Minutes.
    pub session_timeout: Option<i32>,
    /// Taglib URI → location.
    pub taglibs: BTreeMap<String, String>,
    pub welcome_files: Vec<String>,
    /// Locale → character encoding.
    pub locale_encodings: BTreeMap<String, String>,
    pub naming: NamingResources,
}

impl BeanType for WebApp {
    const TYPE_NAME: &'static str = "webapp.WebApp";

    fn resource_holder(&mut self) -> Option<&mut dyn Bean> {
        Some(&mut self.naming)
    }
}

impl WebApp {
    /// The servlet registered under `name`.
    #[must_use]
    pub fn servlet(&self, name: &str) -> Option<&Servlet> {
        self.servlets.iter().find(|s| s.name == name)
    }

    /// The filter definition registered under `name`.
    #[must_use]
    pub fn filter_def(&self, name: &str) -> Option<&FilterDef> {
        self.filter_defs.iter().find(|f| f.filter_name == name)
    }

    pub(crate) fn add_servlet_mapping(&mut self, pattern: String, name: String) -> Result<(), String> {
        if self.servlet(&name).is_none() {
            return Err(format!(
                "servlet mapping {pattern} specifies an unknown servlet name {name}"
            ));
        }
        self.servlet_mappings.insert(pattern, name);
        Ok(())
    }

    pub(crate) fn add_filter_map(&mut self, map: FilterMap) -> Result<(), String> {
        if self.filter_def(&map.filter_name).is_none() {
            return Err(format!(
                "filter mapping specifies an unknown filter name {}",
                map.filter_name
            ));
        }
        if map.servlet_name.is_none() && map.url_pattern.is_none() {
            return Err(format!(
                "filter mapping for {} must specify a servlet name or URL pattern",
                map.filter_name
            ));
        }
        self.filter_maps.push(map);
        Ok(())
    }
}

/// JNDI resources declared by the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NamingResources {
    pub ejbs: Vec<EjbRef>,
    pub local_ejbs: Vec<LocalEjbRef>,
    pub environments: Vec<EnvEntry>,
    pub resources: Vec<ResourceRef>,
    pub resource_env_refs: Vec<ResourceEnvRef>,
}

impl BeanType for NamingResources {
    const TYPE_NAME: &'static str = "webapp.NamingResources";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Filters, errors, login
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterDef {
    pub filter_name: String,
    pub filter_class: Option<String>,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub large_icon: Option<String>,
    pub small_icon: Option<String>,
    pub init_parameters: BTreeMap<String, String>,
}

impl BeanType for FilterDef {
    const TYPE_NAME: &'static str = "webapp.FilterDef";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterMap {
    pub filter_name: String,
    pub servlet_name: Option<String>,
    pub url_pattern: Option<String>,
    /// Empty means `REQUEST` only.
    pub dispatchers: Vec<String>,
}

impl BeanType for FilterMap {
    const TYPE_NAME: &'static str = "webapp.FilterMap";
}

impl FilterMap {
    pub(crate) fn add_dispatcher(&mut self, dispatcher: String) -> Result<(), String> {
        let upper = dispatcher.to_ascii_uppercase();
        if !DISPATCHERS.contains(&upper.as_str()) {
            return Err(format!(
                "unknown dispatcher {dispatcher}, expected one of {}",
                DISPATCHERS.join(", ")
            ));
        }
        if !self.dispatchers.contains(&upper) {
            self.dispatchers.push(upper);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ErrorPage {
    /// 0 when the page is keyed by exception type.
    pub error_code: i32,
    pub exception_type: Option<String>,
    pub location: Option<String>,
}

impl BeanType for ErrorPage {
    const TYPE_NAME: &'static str = "webapp.ErrorPage";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoginConfig {
    pub auth_method: Option<String>,
    pub realm_name: Option<String>,
    pub login_page: Option<String>,
    pub error_page: Option<String>,
}

impl BeanType for LoginConfig {
    const TYPE_NAME: &'static str = "webapp.LoginConfig";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Security
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityConstraint {
    pub display_name: Option<String>,
    /// Set by the presence of `<auth-constraint>`, even an empty one.
    pub auth_constraint: bool,
    pub auth_roles: Vec<String>,
    pub user_constraint: Option<String>,
    pub collections: Vec<SecurityCollection>,
}

impl BeanType for SecurityConstraint {
    const TYPE_NAME: &'static str = "webapp.SecurityConstraint";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SecurityCollection {
    pub name: Option<String>,
    pub methods: Vec<String>,
    pub patterns: Vec<String>,
}

impl BeanType for SecurityCollection {
    const TYPE_NAME: &'static str = "webapp.SecurityCollection";
}

/// Carries a role name and link from `<security-role-ref>` to its servlet.
#[derive(Debug, Default)]
pub struct SecurityRoleRef {
    pub name: String,
    pub link: String,
}

impl BeanType for SecurityRoleRef {
    const TYPE_NAME: &'static str = "webapp.SecurityRoleRef";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Servlets
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Servlet {
    pub name: String,
    pub servlet_class: Option<String>,
    pub jsp_file: Option<String>,
    /// Negative means load lazily.
    pub load_on_startup: i32,
    pub run_as: Option<String>,
    pub init_parameters: BTreeMap<String, String>,
    /// Role name used in code → role link.
    pub security_references: BTreeMap<String, String>,
}

impl BeanType for Servlet {
    const TYPE_NAME: &'static str = "webapp.Servlet";
}

impl Default for Servlet {
    fn default() -> Self {
        Self {
            name: String::new(),
            servlet_class: None,
            jsp_file: None,
            load_on_startup: -1,
            run_as: None,
            init_parameters: BTreeMap::new(),
            security_references: BTreeMap::new(),
        }
    }
}

impl Servlet {
    /// Unparseable values load the servlet at startup, in no particular order.
    pub(crate) fn set_load_on_startup(&mut self, value: &str) {
        self.load_on_startup = value.trim().parse().unwrap_or(0);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Messaging
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageDestination {
    pub name: String,
    pub description: Option<String>,
    pub display_name: Option<String>,
    pub large_icon: Option<String>,
    pub small_icon: Option<String>,
}

impl BeanType for MessageDestination {
    const TYPE_NAME: &'static str = "webapp.MessageDestination";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageDestinationRef {
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub ref_type: Option<String>,
    pub usage: Option<String>,
}

impl BeanType for MessageDestinationRef {
    const TYPE_NAME: &'static str = "webapp.MessageDestinationRef";
}

// ═══════════════════════════════════════════════════════════════════════════════
// Naming resources
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EjbRef {
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub ref_type: Option<String>,
    pub home: Option<String>,
    pub remote: Option<String>,
}

impl BeanType for EjbRef {
    const TYPE_NAME: &'static str = "webapp.EjbRef";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocalEjbRef {
    pub name: String,
    pub description: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub ref_type: Option<String>,
    pub home: Option<String>,
    pub local: Option<String>,
}

impl BeanType for LocalEjbRef {
    const TYPE_NAME: &'static str = "webapp.LocalEjbRef";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnvEntry {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub value: Option<String>,
}

impl BeanType for EnvEntry {
    const TYPE_NAME: &'static str = "webapp.EnvEntry";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceRef {
    pub name: String,
    pub description: Option<String>,
    pub auth: Option<String>,
    pub scope: Option<String>,
    #[serde(rename = "type")]
    pub ref_type: Option<String>,
}

impl BeanType for ResourceRef {
    const TYPE_NAME: &'static str = "webapp.ResourceRef";
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceEnvRef {
    pub name: String,
    #[serde(rename = "type")]
    pub ref_type: Option<String>,
}

impl BeanType for ResourceEnvRef {
    const TYPE_NAME: &'static str = "webapp.ResourceEnvRef";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatcher_is_validated_and_deduplicated() {
        let mut map = FilterMap::default();
        map.add_dispatcher("forward".into()).unwrap();
        map.add_dispatcher("FORWARD".into()).unwrap();
        assert_eq!(map.dispatchers, vec!["FORWARD"]);
        assert!(map.add_dispatcher("LATER".into()).is_err());
    }

    #[test]
    fn load_on_startup_falls_back_to_zero() {
        let mut servlet = Servlet::default();
        assert_eq!(servlet.load_on_startup, -1);
        servlet.set_load_on_startup(" 5 ");
        assert_eq!(servlet.load_on_startup, 5);
        servlet.set_load_on_startup("soon");
        assert_eq!(servlet.load_on_startup, 0);
    }

    #[test]
    fn mappings_must_name_known_targets() {
        let mut app = WebApp::default();
        assert!(app
            .add_servlet_mapping("/x".into(), "missing".into())
            .is_err());
        app.servlets.push(Servlet {
            name: "s".into(),
            ..Servlet::default()
        });
        app.add_servlet_mapping("/x".into(), "s".into()).unwrap();

        let map = FilterMap {
            filter_name: "f".into(),
            url_pattern: Some("/*".into()),
            ..FilterMap::default()
        };
        assert!(app.add_filter_map(map.clone()).is_err());
        app.filter_defs.push(FilterDef {
            filter_name: "f".into(),
            ..FilterDef::default()
        });
        app.add_filter_map(map).unwrap();
        assert!(app
            .add_filter_map(FilterMap {
                filter_name: "f".into(),
                ..FilterMap::default()
            })
            .is_err());
    }
}

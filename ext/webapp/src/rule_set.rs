//! Pattern bindings for `web.xml`.

use trellis::rules::{
    CallMethod, CallParam, ObjectCreate, SetNext, SetPublicId, SetTop, Transient, ValidateOnce,
};
use trellis::{PatternRegistry, RuleSet};

use crate::model::{SecurityRoleRef, Servlet, CONTAINER_TYPE};

const NAMING_RESOURCES: &str = "webapp.NamingResources";

/// The `web.xml` rule set.
///
/// Expects the [`WebApp`](crate::WebApp) to be pushed before the root element; no
/// rule creates it.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis::{Digester, ObjectRef, PatternRegistry};
/// use trellis_webapp::{resolver, WebApp, WebRuleSet};
///
/// let mut rules = PatternRegistry::new();
/// rules.add_rule_set(&WebRuleSet::new());
///
/// let mut digester = Digester::new(Arc::new(rules), Arc::new(resolver()));
/// let app = ObjectRef::new(WebApp::default());
/// digester.push(app.clone()).unwrap();
/// digester.parse_str("<web-app><display-name>Shop</display-name></web-app>").unwrap();
///
/// let name = app.with(|a: &WebApp| a.display_name.clone()).unwrap();
/// assert_eq!(name.as_deref(), Some("Shop"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct WebRuleSet {
    prefix: String,
}

impl WebRuleSet {
    /// Rules for a document whose root is `web-app`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules for `web-app` nested below `prefix` (including the trailing `/`).
    #[must_use]
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
        }
    }

    /// The pattern prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn at(&self, path: &str) -> String {
        format!("{}web-app{path}", self.prefix)
    }
}

impl RuleSet for WebRuleSet {
    fn add_rule_instances(&self, r: &mut PatternRegistry) {
        let p = |path: &str| self.at(path);

        r.add(&p(""), SetPublicId::new("setPublicId"));

        r.add(&p("/context-param"), CallMethod::new("addParameter", 2));
        r.add(&p("/context-param/param-name"), CallParam::new(0));
        r.add(&p("/context-param/param-value"), CallParam::new(1));

        r.add(&p("/display-name"), CallMethod::new("setDisplayName", 0));

        r.add(&p("/distributable"), SetTop::new("setDistributable", true));

        // ── Naming resources (added to the application's holder) ──────────────

        r.add(&p("/ejb-local-ref"), ObjectCreate::new("webapp.LocalEjbRef"));
        r.add(
            &p("/ejb-local-ref"),
            SetNext::new("addLocalEjb", "webapp.LocalEjbRef").via_holder(NAMING_RESOURCES),
        );
        r.add(&p("/ejb-local-ref/description"), CallMethod::new("setDescription", 0));
        r.add(&p("/ejb-local-ref/ejb-link"), CallMethod::new("setLink", 0));
        r.add(&p("/ejb-local-ref/ejb-ref-name"), CallMethod::new("setName", 0));
        r.add(&p("/ejb-local-ref/ejb-ref-type"), CallMethod::new("setType", 0));
        r.add(&p("/ejb-local-ref/local"), CallMethod::new("setLocal", 0));
        r.add(&p("/ejb-local-ref/local-home"), CallMethod::new("setHome", 0));

        r.add(&p("/ejb-ref"), ObjectCreate::new("webapp.EjbRef"));
        r.add(
            &p("/ejb-ref"),
            SetNext::new("addEjb", "webapp.EjbRef").via_holder(NAMING_RESOURCES),
        );
        r.add(&p("/ejb-ref/description"), CallMethod::new("setDescription", 0));
        r.add(&p("/ejb-ref/ejb-link"), CallMethod::new("setLink", 0));
        r.add(&p("/ejb-ref/ejb-ref-name"), CallMethod::new("setName", 0));
        r.add(&p("/ejb-ref/ejb-ref-type"), CallMethod::new("setType", 0));
        r.add(&p("/ejb-ref/home"), CallMethod::new("setHome", 0));
        r.add(&p("/ejb-ref/remote"), CallMethod::new("setRemote", 0));

        r.add(&p("/env-entry"), ObjectCreate::new("webapp.EnvEntry"));
        r.add(
            &p("/env-entry"),
            SetNext::new("addEnvironment", "webapp.EnvEntry").via_holder(NAMING_RESOURCES),
        );
        r.add(&p("/env-entry/description"), CallMethod::new("setDescription", 0));
        r.add(&p("/env-entry/env-entry-name"), CallMethod::new("setName", 0));
        r.add(&p("/env-entry/env-entry-type"), CallMethod::new("setType", 0));
        r.add(&p("/env-entry/env-entry-value"), CallMethod::new("setValue", 0));

        r.add(&p("/resource-env-ref"), ObjectCreate::new("webapp.ResourceEnvRef"));
        r.add(
            &p("/resource-env-ref"),
            SetNext::new("addResourceEnvRef", "webapp.ResourceEnvRef")
                .via_holder(NAMING_RESOURCES),
        );
        r.add(
            &p("/resource-env-ref/resource-env-ref-name"),
            CallMethod::new("setName", 0),
        );
        r.add(
            &p("/resource-env-ref/resource-env-ref-type"),
            CallMethod::new("setType", 0),
        );

        r.add(&p("/resource-ref"), ObjectCreate::new("webapp.ResourceRef"));
        r.add(
            &p("/resource-ref"),
            SetNext::new("addResource", "webapp.ResourceRef").via_holder(NAMING_RESOURCES),
        );
        r.add(&p("/resource-ref/description"), CallMethod::new("setDescription", 0));
        r.add(&p("/resource-ref/res-auth"), CallMethod::new("setAuth", 0));
        r.add(&p("/resource-ref/res-ref-name"), CallMethod::new("setName", 0));
        r.add(&p("/resource-ref/res-sharing-scope"), CallMethod::new("setScope", 0));
        r.add(&p("/resource-ref/res-type"), CallMethod::new("setType", 0));

        // ── Error pages, filters, listeners ───────────────────────────────────

        r.add(&p("/error-page"), ObjectCreate::new("webapp.ErrorPage"));
        r.add(&p("/error-page"), SetNext::new("addErrorPage", "webapp.ErrorPage"));
        r.add(&p("/error-page/error-code"), CallMethod::new("setErrorCode", 0));
        r.add(&p("/error-page/exception-type"), CallMethod::new("setExceptionType", 0));
        r.add(&p("/error-page/location"), CallMethod::new("setLocation", 0));

        r.add(&p("/filter"), ObjectCreate::new("webapp.FilterDef"));
        r.add(&p("/filter"), SetNext::new("addFilterDef", "webapp.FilterDef"));
        r.add(&p("/filter/description"), CallMethod::new("setDescription", 0));
        r.add(&p("/filter/display-name"), CallMethod::new("setDisplayName", 0));
        r.add(&p("/filter/filter-class"), CallMethod::new("setFilterClass", 0));
        r.add(&p("/filter/filter-name"), CallMethod::new("setFilterName", 0));
        r.add(&p("/filter/large-icon"), CallMethod::new("setLargeIcon", 0));
        r.add(&p("/filter/small-icon"), CallMethod::new("setSmallIcon", 0));
        r.add(&p("/filter/init-param"), CallMethod::new("addInitParameter", 2));
        r.add(&p("/filter/init-param/param-name"), CallParam::new(0));
        r.add(&p("/filter/init-param/param-value"), CallParam::new(1));

        r.add(&p("/filter-mapping"), ObjectCreate::new("webapp.FilterMap"));
        r.add(&p("/filter-mapping"), SetNext::new("addFilterMap", "webapp.FilterMap"));
        r.add(&p("/filter-mapping/filter-name"), CallMethod::new("setFilterName", 0));
        r.add(&p("/filter-mapping/servlet-name"), CallMethod::new("setServletName", 0));
        r.add(&p("/filter-mapping/url-pattern"), CallMethod::new("setURLPattern", 0));
        r.add(&p("/filter-mapping/dispatcher"), CallMethod::new("setDispatcher", 0));

        r.add(
            &p("/listener/listener-class"),
            CallMethod::new("addApplicationListener", 0),
        );

        // ── JSP and login configuration ───────────────────────────────────────

        r.add(&p("/jsp-config"), ValidateOnce::new("jsp-config"));
        r.add(
            &p("/jsp-config/jsp-property-group/url-pattern"),
            CallMethod::new("addJspMapping", 0),
        );

        r.add(&p("/login-config"), ValidateOnce::new("login-config"));
        r.add(&p("/login-config"), ObjectCreate::new("webapp.LoginConfig"));
        r.add(&p("/login-config"), SetNext::new("setLoginConfig", "webapp.LoginConfig"));
        r.add(&p("/login-config/auth-method"), CallMethod::new("setAuthMethod", 0));
        r.add(&p("/login-config/realm-name"), CallMethod::new("setRealmName", 0));
        r.add(
            &p("/login-config/form-login-config/form-error-page"),
            CallMethod::new("setErrorPage", 0),
        );
        r.add(
            &p("/login-config/form-login-config/form-login-page"),
            CallMethod::new("setLoginPage", 0),
        );

        r.add(&p("/mime-mapping"), CallMethod::new("addMimeMapping", 2));
        r.add(&p("/mime-mapping/extension"), CallParam::new(0));
        r.add(&p("/mime-mapping/mime-type"), CallParam::new(1));

        // ── Message destinations ──────────────────────────────────────────────

        r.add(&p("/message-destination"), ObjectCreate::new("webapp.MessageDestination"));
        r.add(
            &p("/message-destination"),
            SetNext::new("addMessageDestination", "webapp.MessageDestination"),
        );
        r.add(&p("/message-destination/description"), CallMethod::new("setDescription", 0));
        r.add(&p("/message-destination/display-name"), CallMethod::new("setDisplayName", 0));
        r.add(&p("/message-destination/icon/large-icon"), CallMethod::new("setLargeIcon", 0));
        r.add(&p("/message-destination/icon/small-icon"), CallMethod::new("setSmallIcon", 0));
        r.add(
            &p("/message-destination/message-destination-name"),
            CallMethod::new("setName", 0),
        );

        r.add(
            &p("/message-destination-ref"),
            ObjectCreate::new("webapp.MessageDestinationRef"),
        );
        r.add(
            &p("/message-destination-ref"),
            SetNext::new("addMessageDestinationRef", "webapp.MessageDestinationRef"),
        );
        r.add(
            &p("/message-destination-ref/description"),
            CallMethod::new("setDescription", 0),
        );
        r.add(
            &p("/message-destination-ref/message-destination-link"),
            CallMethod::new("setLink", 0),
        );
        r.add(
            &p("/message-destination-ref/message-destination-ref-name"),
            CallMethod::new("setName", 0),
        );
        r.add(
            &p("/message-destination-ref/message-destination-type"),
            CallMethod::new("setType", 0),
        );
        r.add(
            &p("/message-destination-ref/message-destination-usage"),
            CallMethod::new("setUsage", 0),
        );

        // ── Security ──────────────────────────────────────────────────────────

        r.add(&p("/security-constraint"), ObjectCreate::new("webapp.SecurityConstraint"));
        r.add(
            &p("/security-constraint"),
            SetNext::new("addConstraint", "webapp.SecurityConstraint"),
        );
        r.add(
            &p("/security-constraint/auth-constraint"),
            SetTop::new("setAuthConstraint", true),
        );
        r.add(
            &p("/security-constraint/auth-constraint/role-name"),
            CallMethod::new("addAuthRole", 0),
        );
        r.add(
            &p("/security-constraint/display-name"),
            CallMethod::new("setDisplayName", 0),
        );
        r.add(
            &p("/security-constraint/user-data-constraint/transport-guarantee"),
            CallMethod::new("setUserConstraint", 0),
        );
        r.add(
            &p("/security-constraint/web-resource-collection"),
            ObjectCreate::new("webapp.SecurityCollection"),
        );
        r.add(
            &p("/security-constraint/web-resource-collection"),
            SetNext::new("addCollection", "webapp.SecurityCollection"),
        );
        r.add(
            &p("/security-constraint/web-resource-collection/http-method"),
            CallMethod::new("addMethod", 0),
        );
        r.add(
            &p("/security-constraint/web-resource-collection/url-pattern"),
            CallMethod::new("addPattern", 0),
        );
        r.add(
            &p("/security-constraint/web-resource-collection/web-resource-name"),
            CallMethod::new("setName", 0),
        );

        r.add(&p("/security-role/role-name"), CallMethod::new("addSecurityRole", 0));

        // ── Servlets ──────────────────────────────────────────────────────────

        r.add(&p("/servlet"), ObjectCreate::new("webapp.Servlet"));
        r.add(&p("/servlet"), SetNext::new("addChild", CONTAINER_TYPE));
        r.add(&p("/servlet/init-param"), CallMethod::new("addInitParameter", 2));
        r.add(&p("/servlet/init-param/param-name"), CallParam::new(0));
        r.add(&p("/servlet/init-param/param-value"), CallParam::new(1));
        r.add(&p("/servlet/jsp-file"), CallMethod::new("setJspFile", 0));
        r.add(
            &p("/servlet/load-on-startup"),
            CallMethod::new("setLoadOnStartupString", 0),
        );
        r.add(&p("/servlet/run-as/role-name"), CallMethod::new("setRunAs", 0));
        r.add(
            &p("/servlet/security-role-ref"),
            Transient::<SecurityRoleRef, Servlet>::new(|role, servlet| {
                servlet.security_references.insert(role.name, role.link);
                Ok(())
            }),
        );
        r.add(&p("/servlet/security-role-ref/role-link"), CallMethod::new("setLink", 0));
        r.add(&p("/servlet/security-role-ref/role-name"), CallMethod::new("setName", 0));
        r.add(&p("/servlet/servlet-class"), CallMethod::new("setServletClass", 0));
        r.add(&p("/servlet/servlet-name"), CallMethod::new("setName", 0));

        // Slots are filled out of document order: the pattern is argument 0.
        r.add(&p("/servlet-mapping"), CallMethod::new("addServletMapping", 2));
        r.add(&p("/servlet-mapping/servlet-name"), CallParam::new(1));
        r.add(&p("/servlet-mapping/url-pattern"), CallParam::new(0));

        // ── Session, taglibs, welcome files, locales ──────────────────────────

        r.add(&p("/session-config"), ValidateOnce::new("session-config"));
        r.add(
            &p("/session-config/session-timeout"),
            CallMethod::new("setSessionTimeout", 1).with_param_types(&["int"]),
        );
        r.add(&p("/session-config/session-timeout"), CallParam::new(0));

        r.add(&p("/taglib"), CallMethod::new("addTaglib", 2));
        r.add(&p("/taglib/taglib-location"), CallParam::new(1));
        r.add(&p("/taglib/taglib-uri"), CallParam::new(0));

        r.add(
            &p("/welcome-file-list/welcome-file"),
            CallMethod::new("addWelcomeFile", 0),
        );

        r.add(
            &p("/locale-encoding-mapping-list/locale-encoding-mapping"),
            CallMethod::new("addLocaleEncodingMappingParameter", 2),
        );
        r.add(
            &p("/locale-encoding-mapping-list/locale-encoding-mapping/locale"),
            CallParam::new(0),
        );
        r.add(
            &p("/locale-encoding-mapping-list/locale-encoding-mapping/encoding"),
            CallParam::new(1),
        );
    }
}

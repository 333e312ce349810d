//! trellis-webapp: web application deployment descriptors
//!
//! Maps a `web.xml` onto a typed [`WebApp`] using the trellis dispatch engine.
//!
//! # Architecture
//!
//! ```text
//! web.xml ──quick-xml──► events ──WebRuleSet──► rules ──ClassResolver──► WebApp
//! ```
//!
//! - [`model`] — the object tree (`WebApp`, `Servlet`, `FilterDef`, ...)
//! - [`register_classes`] — names and setters the rules call
//! - [`WebRuleSet`] — which rule fires at which element
//!
//! Naming resources (`<ejb-ref>`, `<env-entry>`, `<resource-ref>`, ...) are added
//! through the application's resource holder, [`NamingResources`].
//!
//! # Example
//!
//! ```
//! let xml = r#"
//!     <web-app>
//!       <servlet>
//!         <servlet-name>hello</servlet-name>
//!         <servlet-class>com.example.Hello</servlet-class>
//!       </servlet>
//!       <servlet-mapping>
//!         <servlet-name>hello</servlet-name>
//!         <url-pattern>/hello</url-pattern>
//!       </servlet-mapping>
//!     </web-app>"#;
//!
//! let app = trellis_webapp::parse_web_xml(xml).unwrap();
//! assert_eq!(app.servlet_mappings["/hello"], "hello");
//! ```

pub mod model;

mod classes;
mod rule_set;

use std::sync::Arc;

use trellis::{DigestError, Digester, ObjectRef, PatternRegistry};

pub use classes::{register_classes, resolver};
pub use model::{
    EjbRef, EnvEntry, ErrorPage, FilterDef, FilterMap, LocalEjbRef, LoginConfig,
    MessageDestination, MessageDestinationRef, NamingResources, ResourceEnvRef, ResourceRef,
    SecurityCollection, SecurityConstraint, SecurityRoleRef, Servlet, WebApp,
};
pub use rule_set::WebRuleSet;

/// A pattern registry holding only the [`WebRuleSet`].
#[must_use]
pub fn rules() -> PatternRegistry {
    let mut registry = PatternRegistry::new();
    registry.add_rule_set(&WebRuleSet::new());
    registry
}

/// A digester ready for `web.xml` documents.
///
/// The [`WebApp`] must still be pushed before each document.
#[must_use]
pub fn digester() -> Digester {
    Digester::new(Arc::new(rules()), Arc::new(resolver()))
}

/// Parse a `web.xml` document into a fresh [`WebApp`].
///
/// # Errors
///
/// Returns the first fatal [`DigestError`]: malformed XML, a repeated
/// `<login-config>`, `<jsp-config>` or `<session-config>`, a mapping that names an
/// unknown servlet or filter, or an unconvertible value (a non-numeric session
/// timeout, say).
pub fn parse_web_xml(xml: &str) -> Result<WebApp, DigestError> {
    parse_with(&mut digester(), xml)
}

/// Parse with a caller-owned digester (tracing enabled, say).
///
/// The digester is recycled first, so it may be reused across documents.
///
/// # Errors
///
/// See [`parse_web_xml`].
pub fn parse_with(digester: &mut Digester, xml: &str) -> Result<WebApp, DigestError> {
    digester.recycle();
    let app = ObjectRef::new(WebApp::default());
    digester.push(app.clone())?;
    digester.parse_str(xml)?;
    let app = app
        .downcast_clone::<WebApp>()
        .ok_or_else(|| DigestError::IllegalState {
            message: "the web application was replaced on the stack".into(),
        })?;
    tracing::debug!(
        servlets = app.servlets.len(),
        filters = app.filter_defs.len(),
        public_id = app.public_id.as_deref().unwrap_or(""),
        "web.xml parsed"
    );
    Ok(app)
}

//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them against the trellis engine. A fixture is a rule
//! set in the same config format [`RuleLoader`] accepts, plus a list of documents and
//! the [`Node`] tree (or error) each one should produce.
//!
//! ```yaml
//! name: nested_nodes
//! rules:
//!   rules:
//!     - { pattern: tree, type: object_create, type_name: test.Node }
//!     - { pattern: "*/node", type: object_create, type_name: test.Node }
//!     - { pattern: "*/node", type: set_next, method: addChild, param_type: test.Node }
//! cases:
//!   - name: one_child
//!     document: <tree><node/></tree>
//!     expect:
//!       children:
//!         - {}
//! ```

use std::sync::Arc;

use serde::Deserialize;
use trellis::prelude::*;
use trellis::{Attributes, IntoRule, RuleLoader, RuleLoaderBuilder, RuleSetConfig};

use crate::{resolver, Node};

/// Type URL of [`TagRule`] in every fixture loader.
pub const TAG_RULE: &str = "test.Tag";

/// A complete test fixture
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rules: RuleSetConfig,
    pub cases: Vec<TestCase>,
}

/// One document and its expected outcome.
///
/// With `error` set, parsing must fail with a message containing it. Otherwise it must
/// succeed and yield `expect` (`None` meaning no object was produced).
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub document: String,
    /// Pushed before the root element.
    #[serde(default)]
    pub root: Option<Node>,
    #[serde(default)]
    pub expect: Option<Node>,
    #[serde(default)]
    pub error: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Custom rule
// ═══════════════════════════════════════════════════════════════════════════════

/// Sets a fixed attribute on the top node when its element begins.
#[derive(Debug)]
pub struct TagRule {
    key: String,
    value: String,
}

/// Config for [`TagRule`].
#[derive(Debug, Deserialize)]
pub struct TagConfig {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl Rule for TagRule {
    fn begin(&self, ctx: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
        let target = ctx.peek(0)?;
        ctx.invoke(
            &target,
            "setAttribute",
            vec![Value::from(self.key.as_str()), Value::from(self.value.as_str())],
            &[ParamType::String, ParamType::String],
        )
        .map(drop)
    }
}

impl IntoRule for TagRule {
    type Config = TagConfig;

    fn from_config(config: Self::Config) -> Result<Arc<dyn Rule>, DigestError> {
        if config.key.is_empty() {
            return Err(DigestError::InvalidConfig {
                reason: "tag key must not be empty".into(),
            });
        }
        Ok(Arc::new(TagRule {
            key: config.key,
            value: config.value,
        }))
    }
}

/// The loader fixtures are built with: built-in rules plus [`TagRule`].
#[must_use]
pub fn loader() -> RuleLoader {
    RuleLoaderBuilder::new().rule::<TagRule>(TAG_RULE).build()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    pub expected: String,
    pub actual: String,
}

impl TestCase {
    fn expected(&self) -> String {
        match &self.error {
            Some(message) => format!("error containing {message:?}"),
            None => format!("{:?}", self.expect),
        }
    }

    fn run(&self, digester: &mut Digester) -> CaseResult {
        digester.recycle();
        let outcome = self
            .root
            .clone()
            .map_or(Ok(()), |root| digester.push(ObjectRef::new(root)))
            .and_then(|()| digester.parse_str(&self.document));

        let (passed, actual) = match (outcome, &self.error) {
            (Err(err), Some(message)) => (err.to_string().contains(message.as_str()), err.to_string()),
            (Err(err), None) => (false, err.to_string()),
            (Ok(result), expected_error) => {
                let node = result.and_then(|o| o.downcast_clone::<Node>());
                let passed = expected_error.is_none() && node == self.expect;
                (passed, format!("{node:?}"))
            }
        };

        CaseResult {
            case_name: self.name.clone(),
            passed,
            expected: self.expected(),
            actual,
        }
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Build a digester for this fixture's rule set.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the rule set is invalid.
    pub fn digester(&self) -> Result<Digester, DigestError> {
        let rules = loader().load(self.rules.clone())?;
        Ok(Digester::new(Arc::new(rules), Arc::new(resolver())))
    }

    /// Run all test cases through one digester, recycled between cases.
    ///
    /// # Errors
    ///
    /// Returns the loader's error if the rule set is invalid.
    pub fn run(&self) -> Result<Vec<CaseResult>, DigestError> {
        let mut digester = self.digester()?;
        Ok(self.cases.iter().map(|case| case.run(&mut digester)).collect())
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        let results = self
            .run()
            .unwrap_or_else(|e| panic!("Fixture '{}' failed to load: {e}", self.name));
        for result in results {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed: expected {}, got {}",
                self.name, result.case_name, result.expected, result.actual
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
name: tagged
rules:
  rules:
    - { pattern: doc, type: object_create, type_name: test.Node }
    - pattern: doc
      type: custom
      type_url: test.Tag
      config: { key: origin, value: fixture }
cases:
  - name: tag_applied
    document: <doc/>
    expect:
      attributes: { origin: fixture }
  - name: wrong_expectation_fails
    document: <doc/>
    expect: {}
"#;

    #[test]
    fn runner_reports_pass_and_fail() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        let results = fixture.run().unwrap();
        assert!(results[0].passed, "{results:?}");
        assert!(!results[1].passed);
        assert!(results[1].actual.contains("origin"));
    }

    #[test]
    fn empty_tag_key_is_rejected_at_load() {
        let yaml = r#"
name: bad
rules:
  rules:
    - { pattern: doc, type: custom, type_url: test.Tag, config: { key: "" } }
cases: []
"#;
        let err = Fixture::from_yaml(yaml).unwrap().run().unwrap_err();
        assert!(err.to_string().contains("tag key must not be empty"));
    }

    #[test]
    fn multi_document_yaml() {
        let yaml = format!("{FIXTURE}\n---\n{FIXTURE}");
        assert_eq!(Fixture::from_yaml_multi(&yaml).unwrap().len(), 2);
    }
}

use crate::{Attributes, Context, DigestError, Rule};

/// Fail with [`DigestError::DuplicateElement`] the second time the element begins.
///
/// The flag lives in the engine's seen-set, keyed by element name, and is cleared
/// only by [`Digester::recycle`](crate::Digester::recycle).
#[derive(Debug, Clone)]
pub struct ValidateOnce {
    element: String,
}

impl ValidateOnce {
    /// Allow `element` at most once.
    #[must_use]
    pub fn new(element: &str) -> Self {
        Self {
            element: element.to_owned(),
        }
    }
}

impl Rule for ValidateOnce {
    fn begin(&self, ctx: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
        if ctx.mark_seen(&self.element) {
            Ok(())
        } else {
            Err(DigestError::DuplicateElement {
                element: self.element.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::digester;
    use crate::{DigesterState, Event, PatternRegistry};

    fn doc() -> Vec<Event> {
        vec![Event::start("app"), Event::start("once"), Event::end("once"), Event::end("app")]
    }

    #[test]
    fn seen_flags_outlive_a_finished_document() {
        let mut rules = PatternRegistry::new();
        rules.add("app/once", ValidateOnce::new("once"));
        let mut d = digester(rules);

        assert!(d.parse_events(doc()).is_ok());
        assert_eq!(d.state(), DigesterState::Done);
        assert!(matches!(
            d.parse_events(doc()),
            Err(DigestError::DuplicateElement { element }) if element == "once"
        ));

        d.recycle();
        assert!(d.parse_events(doc()).is_ok());
    }

    #[test]
    fn distinct_elements_are_tracked_separately() {
        let mut rules = PatternRegistry::new();
        rules.add("app/a", ValidateOnce::new("a"));
        rules.add("app/b", ValidateOnce::new("b"));
        let mut d = digester(rules);
        let events = vec![
            Event::start("app"),
            Event::start("a"),
            Event::end("a"),
            Event::start("b"),
            Event::end("b"),
            Event::end("app"),
        ];
        assert!(d.parse_events(events).is_ok());
    }
}

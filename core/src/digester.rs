//! The dispatch engine.

use std::sync::Arc;

use crate::context::{DocumentState, ElementFrame};
use crate::{
    Attributes, ClassResolver, Context, DigestError, DispatchTrace, Event, MatchedRules,
    ObjectRef, ObjectStack, PatternRegistry, Phase, MAX_DEPTH,
};

/// Lifecycle of a [`Digester`].
///
/// ```text
/// Idle ──start──► Parsing ──root closed──► Done ──start──► Parsing …
///                    │
///                    └──error──► Failed ──recycle()──► Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigesterState {
    /// Constructed or recycled; no document yet.
    Idle,
    /// Inside a document.
    Parsing,
    /// The root element closed (or the document ended).
    Done,
    /// A callback failed. Every further event is rejected until [`Digester::recycle`].
    Failed,
}

/// One open element.
#[derive(Debug)]
struct OpenElement {
    name: String,
    namespace: Option<String>,
    text: String,
    matched: Option<MatchedRules>,
}

/// Drives rule callbacks from a stream of structural events.
///
/// The pattern registry and class resolver are immutable and shared; everything
/// mutable (path, text buffers, object stack, parameter frames, seen flags) belongs
/// to this engine. One engine processes one document at a time. Between documents,
/// per-document state resets automatically; the seen flags of occurs-at-most-once
/// rules persist until [`recycle`](Self::recycle).
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use trellis::prelude::*;
/// use trellis::rules::ValidateOnce;
///
/// let mut rules = PatternRegistry::new();
/// rules.add("app/login-config", ValidateOnce::new("login-config"));
/// let mut digester = Digester::new(Arc::new(rules), Arc::new(ClassResolver::empty()));
///
/// let doc = || vec![
///     Event::start("app"),
///     Event::start("login-config"), Event::end("login-config"),
///     Event::end("app"),
/// ];
/// assert!(digester.parse_events(doc()).is_ok());
///
/// // Same digester, no recycle: the flag is still set.
/// assert!(matches!(
///     digester.parse_events(doc()),
///     Err(DigestError::DuplicateElement { .. })
/// ));
///
/// digester.recycle();
/// assert!(digester.parse_events(doc()).is_ok());
/// ```
pub struct Digester {
    rules: Arc<PatternRegistry>,
    resolver: Arc<ClassResolver>,
    state: DigesterState,
    doc: DocumentState,
    open: Vec<OpenElement>,
    trace: Option<DispatchTrace>,
}

impl Digester {
    /// Create an engine over shared configuration.
    #[must_use]
    pub fn new(rules: Arc<PatternRegistry>, resolver: Arc<ClassResolver>) -> Self {
        Self {
            rules,
            resolver,
            state: DigesterState::Idle,
            doc: DocumentState::default(),
            open: Vec::new(),
            trace: None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> DigesterState {
        self.state
    }

    /// The object stack.
    #[must_use]
    pub fn stack(&self) -> &ObjectStack {
        &self.doc.stack
    }

    /// The shared pattern registry.
    #[must_use]
    pub fn rules(&self) -> &PatternRegistry {
        &self.rules
    }

    /// The shared class resolver.
    #[must_use]
    pub fn resolver(&self) -> &ClassResolver {
        &self.resolver
    }

    /// Current element path, `/`-separated.
    #[must_use]
    pub fn current_path(&self) -> String {
        self.path_string()
    }

    /// Public identifier of the current document.
    #[must_use]
    pub fn public_id(&self) -> Option<&str> {
        self.doc.public_id.as_deref()
    }

    /// Record the document's public identifier (from a DOCTYPE, typically).
    pub fn set_public_id(&mut self, public_id: impl Into<String>) {
        self.doc.public_id = Some(public_id.into());
    }

    /// Record every rule callback of subsequent documents.
    pub fn enable_trace(&mut self) {
        self.trace = Some(DispatchTrace::default());
    }

    /// The trace of the current (or last) document, if tracing is enabled.
    #[must_use]
    pub fn trace(&self) -> Option<&DispatchTrace> {
        self.trace.as_ref()
    }

    /// The parse result.
    ///
    /// The bottom object of the stack if any remain, otherwise the first object
    /// pushed during the document, otherwise `None`.
    #[must_use]
    pub fn result(&self) -> Option<ObjectRef> {
        self.doc
            .stack
            .bottom()
            .or_else(|| self.doc.stack.root())
            .cloned()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Clear all per-document state, including the seen flags.
    ///
    /// The registry and resolver are untouched. Leaves the engine `Idle`.
    pub fn recycle(&mut self) {
        self.doc = DocumentState::default();
        self.open.clear();
        if self.trace.is_some() {
            self.trace = Some(DispatchTrace::default());
        }
        self.state = DigesterState::Idle;
        tracing::debug!("digester recycled");
    }

    /// Push a caller-owned object before the root element, e.g. the object the
    /// document should populate.
    ///
    /// # Errors
    ///
    /// - [`DigestError::IllegalState`] inside an element or after a failure
    /// - [`DigestError::StackOverflow`] beyond the stack limit
    pub fn push(&mut self, object: ObjectRef) -> Result<(), DigestError> {
        self.start_document()?;
        if !self.open.is_empty() {
            return Err(DigestError::illegal_state(
                "objects can only be pushed before the root element",
            ));
        }
        self.doc.stack.push(object, "")
    }

    /// Begin a document.
    ///
    /// A no-op if a document is already in progress. From `Idle` or `Done`, resets
    /// per-document state (the seen flags are kept).
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::IllegalState`] after a failure.
    pub fn start_document(&mut self) -> Result<(), DigestError> {
        match self.state {
            DigesterState::Failed => Err(Self::failed()),
            DigesterState::Parsing => Ok(()),
            DigesterState::Idle | DigesterState::Done => {
                self.doc.reset();
                self.open.clear();
                if self.trace.is_some() {
                    self.trace = Some(DispatchTrace::default());
                }
                self.state = DigesterState::Parsing;
                Ok(())
            }
        }
    }

    /// End the document and return the result.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::IllegalState`] after a failure or with elements still open.
    pub fn end_document(&mut self) -> Result<Option<ObjectRef>, DigestError> {
        match self.state {
            DigesterState::Failed => Err(Self::failed()),
            DigesterState::Parsing if !self.open.is_empty() => {
                let err = DigestError::illegal_state(format!(
                    "document ended with <{}> still open",
                    self.path_string()
                ));
                self.state = DigesterState::Failed;
                Err(err)
            }
            _ => {
                self.state = DigesterState::Done;
                Ok(self.result())
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Events
    // ═══════════════════════════════════════════════════════════════════════

    /// An element opened: extend the path, resolve rules, run begin callbacks.
    ///
    /// Starts a document from `Idle`. Once the root element has closed, only
    /// [`start_document`](Self::start_document) or a fresh `parse_*` call begins
    /// the next one.
    ///
    /// # Errors
    ///
    /// Any callback error (the engine is then `Failed`), nesting past [`MAX_DEPTH`],
    /// or [`DigestError::IllegalState`] for an element after the root closed.
    pub fn start_element(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        attributes: &Attributes,
    ) -> Result<(), DigestError> {
        let result = match self.state {
            DigesterState::Done => Err(DigestError::illegal_state(format!(
                "<{name}> is content after the root element"
            ))),
            _ => self
                .start_document()
                .and_then(|()| self.begin(name, namespace, attributes)),
        };
        self.fail_on_err(result)
    }

    /// Character data for the current element. Ignored outside the root element.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::IllegalState`] after a failure.
    pub fn characters(&mut self, text: &str) -> Result<(), DigestError> {
        if self.state == DigesterState::Failed {
            return Err(Self::failed());
        }
        if let Some(open) = self.open.last_mut() {
            open.text.push_str(text);
        }
        Ok(())
    }

    /// An element closed: run body callbacks, then end callbacks in reverse, then
    /// shorten the path.
    ///
    /// # Errors
    ///
    /// Any callback error (the engine is then `Failed`), or a name that does not
    /// match the open element.
    pub fn end_element(&mut self, name: &str) -> Result<(), DigestError> {
        if self.state != DigesterState::Parsing {
            return Err(match self.state {
                DigesterState::Failed => Self::failed(),
                _ => DigestError::illegal_state(format!("</{name}> outside a document")),
            });
        }
        let result = self.finish(name);
        self.fail_on_err(result)
    }

    /// Dispatch one event.
    ///
    /// # Errors
    ///
    /// See [`start_element`](Self::start_element), [`characters`](Self::characters),
    /// and [`end_element`](Self::end_element).
    pub fn handle(&mut self, event: Event) -> Result<(), DigestError> {
        match event {
            Event::StartElement {
                name,
                namespace,
                attributes,
            } => self.start_element(&name, namespace.as_deref(), &attributes),
            Event::Characters(text) => self.characters(&text),
            Event::EndElement { name } => self.end_element(&name),
        }
    }

    /// Process a complete document given as events.
    ///
    /// # Errors
    ///
    /// The first error raised; the engine is then `Failed`.
    pub fn parse_events(
        &mut self,
        events: impl IntoIterator<Item = Event>,
    ) -> Result<Option<ObjectRef>, DigestError> {
        self.start_document()?;
        for event in events {
            self.handle(event)?;
        }
        self.end_document()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Internals
    // ═══════════════════════════════════════════════════════════════════════

    fn begin(
        &mut self,
        name: &str,
        namespace: Option<&str>,
        attributes: &Attributes,
    ) -> Result<(), DigestError> {
        if self.open.len() >= MAX_DEPTH {
            return Err(DigestError::NestingTooDeep {
                depth: self.open.len() + 1,
                max: MAX_DEPTH,
            });
        }
        let segments: Vec<&str> = self
            .open
            .iter()
            .map(|e| e.name.as_str())
            .chain(std::iter::once(name))
            .collect();
        let path = segments.join("/");
        let matched = self.rules.match_segments(&segments, namespace);
        tracing::trace!(path = %path, pattern = matched.as_ref().map(|m| m.pattern.as_str()), "start element");

        if let Some(m) = &matched {
            let frame = ElementFrame {
                name,
                namespace,
                path: &path,
                pattern: &m.pattern,
                body_text: None,
            };
            for rule in &m.rules {
                if let Some(trace) = self.trace.as_mut() {
                    trace.record(Phase::Begin, &path, &m.pattern, rule);
                }
                tracing::debug!(path = %path, rule = ?rule, "begin");
                let mut ctx = Context::new(&mut self.doc, &self.resolver, frame);
                rule.begin(&mut ctx, attributes)?;
            }
            self.run_deferred(frame)?;
        }

        self.open.push(OpenElement {
            name: name.to_owned(),
            namespace: namespace.map(str::to_owned),
            text: String::new(),
            matched,
        });
        Ok(())
    }

    fn finish(&mut self, name: &str) -> Result<(), DigestError> {
        let path = self.path_string();
        let open = self.open.pop().ok_or_else(|| {
            DigestError::illegal_state(format!("</{name}> without a matching start"))
        })?;
        if open.name != name {
            return Err(DigestError::illegal_state(format!(
                "</{name}> does not close <{}> at {path}",
                open.name
            )));
        }
        tracing::trace!(path = %path, "end element");

        if let Some(m) = &open.matched {
            let frame = ElementFrame {
                name,
                namespace: open.namespace.as_deref(),
                path: &path,
                pattern: &m.pattern,
                body_text: Some(&open.text),
            };
            for rule in &m.rules {
                if let Some(trace) = self.trace.as_mut() {
                    trace.record(Phase::Body, &path, &m.pattern, rule);
                }
                let mut ctx = Context::new(&mut self.doc, &self.resolver, frame);
                rule.body(&mut ctx, &open.text)?;
            }
            for rule in m.rules.iter().rev() {
                if let Some(trace) = self.trace.as_mut() {
                    trace.record(Phase::End, &path, &m.pattern, rule);
                }
                tracing::debug!(path = %path, rule = ?rule, "end");
                let mut ctx = Context::new(&mut self.doc, &self.resolver, frame);
                rule.end(&mut ctx)?;
            }
            self.run_deferred(frame)?;
        }

        if self.open.is_empty() {
            self.state = DigesterState::Done;
            tracing::debug!(depth = self.doc.stack.depth(), "root element closed");
        }
        Ok(())
    }

    /// Run work the element's callbacks scheduled with [`Context::defer`].
    fn run_deferred(&mut self, frame: ElementFrame<'_>) -> Result<(), DigestError> {
        for call in std::mem::take(&mut self.doc.deferred) {
            let mut ctx = Context::new(&mut self.doc, &self.resolver, frame);
            call.run(&mut ctx)?;
        }
        Ok(())
    }

    fn fail_on_err(&mut self, result: Result<(), DigestError>) -> Result<(), DigestError> {
        if let Err(err) = &result {
            self.abort(err);
        }
        result
    }

    /// Mark the document failed after an error outside rule callbacks.
    pub(crate) fn abort(&mut self, err: &DigestError) {
        tracing::debug!(path = %self.path_string(), error = %err, "document failed");
        self.state = DigesterState::Failed;
    }

    fn path_string(&self) -> String {
        self.open
            .iter()
            .map(|e| e.name.as_str())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn failed() -> DigestError {
        DigestError::illegal_state("a previous callback failed; call recycle() before reuse")
    }
}

impl std::fmt::Debug for Digester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Digester")
            .field("state", &self.state)
            .field("path", &self.path_string())
            .field("depth", &self.doc.stack.depth())
            .field("rules", &self.rules.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CallMethod, ObjectCreate, SetNext, ValidateOnce};
    use crate::{BeanType, Child, ClassBuilder, ClassResolverBuilder, Rule};
    use std::sync::Mutex;

    // ── Fixtures ──

    #[derive(Debug, Clone, Default)]
    struct TypeX {
        name: String,
    }
    impl BeanType for TypeX {
        const TYPE_NAME: &'static str = "test.TypeX";
    }

    #[derive(Debug, Default)]
    struct Root {
        children: Vec<TypeX>,
    }
    impl BeanType for Root {
        const TYPE_NAME: &'static str = "test.Root";
    }

    fn resolver() -> Arc<ClassResolver> {
        Arc::new(
            ClassResolverBuilder::new()
                .class(
                    ClassBuilder::<TypeX>::new()
                        .default_constructor()
                        .method("setName", |x: &mut TypeX, name: String| x.name = name)
                        .build(),
                )
                .class(
                    ClassBuilder::<Root>::new()
                        .default_constructor()
                        .method("addChild", |r: &mut Root, Child(x): Child<TypeX>| {
                            r.children.push(x)
                        })
                        .build(),
                )
                .build(),
        )
    }

    fn abc() -> Vec<Event> {
        vec![
            Event::start("a"),
            Event::start("b"),
            Event::start("c"),
            Event::text("hello"),
            Event::end("c"),
            Event::end("b"),
            Event::end("a"),
        ]
    }

    /// Records callbacks into a shared log.
    #[derive(Debug)]
    struct Recorder {
        id: usize,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Rule for Recorder {
        fn begin(&self, _: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
            self.log.lock().unwrap().push(format!("begin{}", self.id));
            Ok(())
        }
        fn body(&self, _: &mut Context<'_>, text: &str) -> Result<(), DigestError> {
            self.log.lock().unwrap().push(format!("body{}:{text}", self.id));
            Ok(())
        }
        fn end(&self, _: &mut Context<'_>) -> Result<(), DigestError> {
            self.log.lock().unwrap().push(format!("end{}", self.id));
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Fails;
    impl Rule for Fails {
        fn begin(&self, _: &mut Context<'_>, _: &Attributes) -> Result<(), DigestError> {
            Err(DigestError::illegal_state("boom"))
        }
    }

    #[derive(Debug)]
    struct PopOnly;
    impl Rule for PopOnly {
        fn end(&self, ctx: &mut Context<'_>) -> Result<(), DigestError> {
            ctx.pop().map(|_| ())
        }
    }

    // ── Ordering ──

    #[test]
    fn begin_in_order_end_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut rules = PatternRegistry::new();
        for id in 1..=3 {
            rules.add(
                "a",
                Recorder {
                    id,
                    log: Arc::clone(&log),
                },
            );
        }
        let mut d = Digester::new(Arc::new(rules), resolver());
        d.parse_events(vec![Event::start("a"), Event::text("t"), Event::end("a")])
            .unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["begin1", "begin2", "begin3", "body1:t", "body2:t", "body3:t", "end3", "end2", "end1"]
        );
    }

    #[test]
    fn exact_pattern_shadows_wildcard() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut rules = PatternRegistry::new();
        rules.add("*/b", Recorder { id: 1, log: Arc::clone(&log) });
        rules.add("a/b", Recorder { id: 2, log: Arc::clone(&log) });
        let mut d = Digester::new(Arc::new(rules), resolver());
        d.parse_events(vec![
            Event::start("a"),
            Event::start("b"),
            Event::end("b"),
            Event::end("a"),
        ])
        .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["begin2", "body2:", "end2"]);
    }

    #[test]
    fn parent_text_survives_children() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut rules = PatternRegistry::new();
        rules.add("a", Recorder { id: 1, log: Arc::clone(&log) });
        let mut d = Digester::new(Arc::new(rules), resolver());
        d.parse_events(vec![
            Event::start("a"),
            Event::text("x"),
            Event::start("b"),
            Event::text("inner"),
            Event::end("b"),
            Event::text("y"),
            Event::end("a"),
        ])
        .unwrap();
        assert!(log.lock().unwrap().contains(&"body1:xy".to_string()));
    }

    // ── Stack and result ──

    #[test]
    fn create_and_call_method_scenario() {
        let mut rules = PatternRegistry::new();
        rules.add("a/b", ObjectCreate::new("test.TypeX"));
        rules.add("a/b/c", CallMethod::new("setName", 0));
        let mut d = Digester::new(Arc::new(rules), resolver());

        let result = d.parse_events(abc()).unwrap().unwrap();
        assert_eq!(d.stack().depth(), 0);
        assert_eq!(
            result.with(|x: &TypeX| x.name.clone()),
            Some("hello".to_string())
        );
        assert_eq!(d.state(), DigesterState::Done);
    }

    #[test]
    fn set_next_wires_child_into_parent() {
        let mut rules = PatternRegistry::new();
        rules.add("a", ObjectCreate::new("test.Root"));
        rules.add("a/b", ObjectCreate::new("test.TypeX"));
        rules.add("a/b", SetNext::new("addChild", "test.TypeX"));
        rules.add("a/b/c", CallMethod::new("setName", 0));
        let mut d = Digester::new(Arc::new(rules), resolver());

        let root = d.parse_events(abc()).unwrap().unwrap();
        let names = root.with(|r: &Root| r.children.iter().map(|c| c.name.clone()).collect::<Vec<_>>());
        assert_eq!(names, Some(vec!["hello".to_string()]));
    }

    #[test]
    fn push_pop_pair_leaves_depth_unchanged() {
        let mut rules = PatternRegistry::new();
        rules.add("a/b", ObjectCreate::new("test.TypeX"));
        let mut d = Digester::new(Arc::new(rules), resolver());
        let root = ObjectRef::new(Root::default());
        d.push(root.clone()).unwrap();
        d.start_element("a", None, &Attributes::new()).unwrap();
        d.start_element("b", None, &Attributes::new()).unwrap();
        assert_eq!(d.stack().depth(), 2);
        d.end_element("b").unwrap();
        assert_eq!(d.stack().depth(), 1);
        d.end_element("a").unwrap();
        assert_eq!(d.end_document().unwrap(), Some(root));
    }

    #[test]
    fn nothing_pushed_means_no_result() {
        let mut d = Digester::new(Arc::new(PatternRegistry::new()), resolver());
        assert_eq!(d.parse_events(abc()).unwrap(), None);
    }

    #[test]
    fn missing_method_does_not_abort() {
        let mut rules = PatternRegistry::new();
        rules.add("a/b", ObjectCreate::new("test.TypeX"));
        rules.add("a/b/c", CallMethod::new("setNickname", 0));
        let mut d = Digester::new(Arc::new(rules), resolver());
        let result = d.parse_events(abc()).unwrap().unwrap();
        assert_eq!(result.with(|x: &TypeX| x.name.clone()), Some(String::new()));
    }

    // ── Failure ──

    #[test]
    fn callback_error_fails_the_engine() {
        let mut rules = PatternRegistry::new();
        rules.add("a/b", Fails);
        let mut d = Digester::new(Arc::new(rules), resolver());
        let err = d.parse_events(abc()).unwrap_err();
        assert_eq!(err, DigestError::illegal_state("boom"));
        assert_eq!(d.state(), DigesterState::Failed);
        assert!(d.characters("x").is_err());
        assert!(d.parse_events(abc()).is_err());

        d.recycle();
        assert_eq!(d.state(), DigesterState::Idle);
    }

    #[test]
    fn pop_on_empty_stack_is_underflow() {
        let mut rules = PatternRegistry::new();
        rules.add("a", PopOnly);
        let mut d = Digester::new(Arc::new(rules), resolver());
        let err = d
            .parse_events(vec![Event::start("a"), Event::end("a")])
            .unwrap_err();
        assert!(matches!(err, DigestError::StackUnderflow { .. }));
    }

    #[test]
    fn mismatched_end_is_illegal() {
        let mut d = Digester::new(Arc::new(PatternRegistry::new()), resolver());
        let err = d
            .parse_events(vec![Event::start("a"), Event::end("b")])
            .unwrap_err();
        assert!(matches!(err, DigestError::IllegalState { .. }));
    }

    #[test]
    fn unclosed_document_is_illegal() {
        let mut d = Digester::new(Arc::new(PatternRegistry::new()), resolver());
        assert!(d.parse_events(vec![Event::start("a")]).is_err());
    }

    #[test]
    fn second_root_in_one_parse_is_illegal() {
        let mut rules = PatternRegistry::new();
        rules.add("a", ObjectCreate::new("test.Root"));
        let mut d = Digester::new(Arc::new(rules), resolver());
        let err = d
            .parse_events(vec![
                Event::start("a"),
                Event::end("a"),
                Event::start("a"),
                Event::end("a"),
            ])
            .unwrap_err();
        assert!(matches!(err, DigestError::IllegalState { .. }));
        assert!(err.to_string().contains("after the root element"), "{err}");
        assert_eq!(d.state(), DigesterState::Failed);
    }

    #[test]
    fn only_start_document_begins_the_next_document() {
        let mut d = Digester::new(Arc::new(PatternRegistry::new()), resolver());
        let root = ObjectRef::new(Root::default());
        d.push(root.clone()).unwrap();
        d.start_element("a", None, &Attributes::new()).unwrap();
        d.end_element("a").unwrap();
        assert_eq!(d.state(), DigesterState::Done);

        d.start_document().unwrap();
        d.start_element("a", None, &Attributes::new()).unwrap();
        d.end_element("a").unwrap();
        assert_eq!(d.end_document().unwrap(), None);

        assert!(d.start_element("a", None, &Attributes::new()).is_err());
        assert_eq!(d.state(), DigesterState::Failed);
    }

    #[test]
    fn validate_once_within_one_document() {
        let mut rules = PatternRegistry::new();
        rules.add("app/login-config", ValidateOnce::new("login-config"));
        let mut d = Digester::new(Arc::new(rules), resolver());
        let err = d
            .parse_events(vec![
                Event::start("app"),
                Event::start("login-config"),
                Event::end("login-config"),
                Event::start("login-config"),
                Event::end("login-config"),
                Event::end("app"),
            ])
            .unwrap_err();
        assert_eq!(
            err,
            DigestError::DuplicateElement {
                element: "login-config".into()
            }
        );
    }

    #[test]
    fn nesting_is_bounded() {
        let mut d = Digester::new(Arc::new(PatternRegistry::new()), resolver());
        let events = (0..=MAX_DEPTH).map(|_| Event::start("n"));
        assert!(matches!(
            d.parse_events(events),
            Err(DigestError::NestingTooDeep { .. })
        ));
    }

    // ── Trace ──

    #[test]
    fn trace_records_every_callback() {
        let mut rules = PatternRegistry::new();
        rules.add("a/b", ObjectCreate::new("test.TypeX"));
        rules.add("a/b/c", CallMethod::new("setName", 0));
        let mut d = Digester::new(Arc::new(rules), resolver());
        d.enable_trace();
        d.parse_events(abc()).unwrap();

        let trace = d.trace().unwrap();
        let phases: Vec<(Phase, &str)> = trace
            .steps
            .iter()
            .map(|s| (s.phase, s.path.as_str()))
            .collect();
        assert_eq!(
            phases,
            vec![
                (Phase::Begin, "a/b"),
                (Phase::Begin, "a/b/c"),
                (Phase::Body, "a/b/c"),
                (Phase::End, "a/b/c"),
                (Phase::Body, "a/b"),
                (Phase::End, "a/b"),
            ]
        );
    }
}

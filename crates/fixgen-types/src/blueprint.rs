use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::anyhow;
use indexmap::IndexMap;

use crate::classify::{DeclarationClass, classify};
use crate::lazy::LazyValue;
use crate::naming::{SEPARATOR, underscore};
use crate::value::{ObjectRef, Sequence, Value};

pub type Constructor =
    Arc<dyn Fn(&ModelType, IndexMap<String, Value>) -> anyhow::Result<Value> + Send + Sync>;
pub type HookFn =
    Arc<dyn Fn(&Value, &BuildStep, &PostGenerationContext) -> anyhow::Result<Value> + Send + Sync>;
pub type AfterPostgenerationFn =
    Arc<dyn Fn(&Value, &IndexMap<String, Value>) -> anyhow::Result<()> + Send + Sync>;

/// The type a blueprint constructs, plus its "create" strategy.
#[derive(Clone)]
pub struct ModelType {
    name: String,
    constructor: Constructor,
}

impl ModelType {
    /// Model whose instances are plain [`ObjectRef`]s holding the keyword arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constructor: Arc::new(|model: &ModelType, kwargs| {
                Ok(Value::Object(ObjectRef::new(model.name(), kwargs)))
            }),
        }
    }

    pub fn with_constructor(
        mut self,
        constructor: impl Fn(&ModelType, IndexMap<String, Value>) -> anyhow::Result<Value>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.constructor = Arc::new(constructor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn construct(&self, kwargs: IndexMap<String, Value>) -> anyhow::Result<Value> {
        (self.constructor)(self, kwargs)
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ModelType({})", self.name)
    }
}

/// Deferred handle to a blueprint so blueprints can reference each other in cycles.
#[derive(Clone)]
pub struct BlueprintRef(Arc<dyn Fn() -> Arc<Blueprint> + Send + Sync>);

impl BlueprintRef {
    pub fn new(get: impl Fn() -> Arc<Blueprint> + Send + Sync + 'static) -> Self {
        BlueprintRef(Arc::new(get))
    }

    pub fn get(&self) -> Arc<Blueprint> {
        (self.0)()
    }
}

impl From<Arc<Blueprint>> for BlueprintRef {
    fn from(blueprint: Arc<Blueprint>) -> Self {
        BlueprintRef::new(move || blueprint.clone())
    }
}

/// Construction-step token handed to post-generation hooks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildStep {
    pub fixture: String,
    pub sequence: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PostGenerationContext {
    pub value_provided: bool,
    pub value: Value,
    pub extra: IndexMap<String, Value>,
}

/// Side effect run against an already-built instance.
#[derive(Clone)]
pub struct PostHook {
    hook: HookFn,
    extract: Value,
    context: IndexMap<String, Value>,
}

impl PostHook {
    pub fn new(
        hook: impl Fn(&Value, &BuildStep, &PostGenerationContext) -> anyhow::Result<Value>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            hook: Arc::new(hook),
            extract: Value::NotProvided,
            context: IndexMap::new(),
        }
    }

    /// Default extracted value; [`Value::NotProvided`] unless set.
    pub fn with_extract(mut self, value: impl Into<Value>) -> Self {
        self.extract = value.into();
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn extract(&self) -> &Value {
        &self.extract
    }

    pub fn context(&self) -> &IndexMap<String, Value> {
        &self.context
    }

    pub fn call(
        &self,
        instance: &Value,
        step: &BuildStep,
        context: &PostGenerationContext,
    ) -> anyhow::Result<Value> {
        (self.hook)(instance, step, context)
    }
}

/// One named attribute of a blueprint.
#[derive(Clone)]
pub enum Declaration {
    Plain(Value),
    Nested(BlueprintRef),
    Reverse(BlueprintRef),
    PostHook(PostHook),
}

impl Declaration {
    pub fn nested(get: impl Fn() -> Arc<Blueprint> + Send + Sync + 'static) -> Self {
        Declaration::Nested(BlueprintRef::new(get))
    }

    pub fn reverse(get: impl Fn() -> Arc<Blueprint> + Send + Sync + 'static) -> Self {
        Declaration::Reverse(BlueprintRef::new(get))
    }

    /// Child blueprint of nested and reverse declarations.
    pub fn blueprint(&self) -> Option<Arc<Blueprint>> {
        match self {
            Declaration::Nested(blueprint) | Declaration::Reverse(blueprint) => {
                Some(blueprint.get())
            }
            _ => None,
        }
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            Declaration::Nested(blueprint) => write!(f, "Nested({})", blueprint.get().name()),
            Declaration::Reverse(blueprint) => write!(f, "Reverse({})", blueprint.get().name()),
            Declaration::PostHook(hook) => write!(f, "PostHook(extract={:?})", hook.extract),
        }
    }
}

impl From<Value> for Declaration {
    fn from(value: Value) -> Self {
        Declaration::Plain(value)
    }
}

impl From<&str> for Declaration {
    fn from(value: &str) -> Self {
        Declaration::Plain(value.into())
    }
}

impl From<String> for Declaration {
    fn from(value: String) -> Self {
        Declaration::Plain(value.into())
    }
}

impl From<i64> for Declaration {
    fn from(value: i64) -> Self {
        Declaration::Plain(value.into())
    }
}

impl From<bool> for Declaration {
    fn from(value: bool) -> Self {
        Declaration::Plain(value.into())
    }
}

impl From<LazyValue> for Declaration {
    fn from(lazy: LazyValue) -> Self {
        Declaration::Plain(Value::Lazy(lazy))
    }
}

impl From<Sequence> for Declaration {
    fn from(sequence: Sequence) -> Self {
        Declaration::Plain(Value::Sequence(sequence))
    }
}

impl From<PostHook> for Declaration {
    fn from(hook: PostHook) -> Self {
        Declaration::PostHook(hook)
    }
}

/// Declarative description of how to build a model instance.
///
/// The declaration set is split once, in [`BlueprintBuilder::build`], into
/// pre-construction names (constructor arguments), post-construction names (hooks and
/// reverse associations) and context entries (`root__key` under a nested, reverse or
/// hook declaration).
pub struct Blueprint {
    name: String,
    model: Option<ModelType>,
    is_abstract: bool,
    declarations: IndexMap<String, Declaration>,
    pre: Vec<String>,
    post: Vec<String>,
    contexts: IndexMap<String, IndexMap<String, Value>>,
    after_postgeneration: Option<AfterPostgenerationFn>,
    sequence: AtomicU64,
}

impl Blueprint {
    pub fn builder(name: impl Into<String>) -> BlueprintBuilder {
        BlueprintBuilder {
            name: name.into(),
            model: None,
            is_abstract: false,
            declarations: IndexMap::new(),
            after_postgeneration: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> Option<&ModelType> {
        self.model.as_ref()
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Default model fixture name: the underscored model type name.
    pub fn model_name(&self) -> Option<String> {
        self.model.as_ref().map(|model| underscore(model.name()))
    }

    /// Blueprint-reference fixture name: the underscored blueprint name.
    pub fn factory_name(&self) -> String {
        underscore(&self.name)
    }

    pub fn declarations(&self) -> &IndexMap<String, Declaration> {
        &self.declarations
    }

    pub fn declaration(&self, attr: &str) -> Option<&Declaration> {
        self.declarations.get(attr)
    }

    pub fn pre_declarations(&self) -> &[String] {
        &self.pre
    }

    pub fn post_declarations(&self) -> &[String] {
        &self.post
    }

    /// Context entries of a nested, reverse or hook declaration. For a hook these are its
    /// own defaults overridden by `hook__key` declarations.
    pub fn hook_context(&self, attr: &str) -> Option<&IndexMap<String, Value>> {
        self.contexts.get(attr)
    }

    pub fn after_postgeneration(&self) -> Option<&AfterPostgenerationFn> {
        self.after_postgeneration.as_ref()
    }

    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Builds an instance with "create" semantics. Sequence arguments are resolved
    /// against the step's sequence number first.
    pub fn create(&self, step: &BuildStep, kwargs: IndexMap<String, Value>) -> anyhow::Result<Value> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| anyhow!("blueprint {} has no model type", self.name))?;
        let kwargs = kwargs
            .into_iter()
            .map(|(key, value)| match value {
                Value::Sequence(sequence) => (key, sequence.value_at(step.sequence)),
                other => (key, other),
            })
            .collect();
        model.construct(kwargs)
    }
}

impl fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("declarations", &self.declarations.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub struct BlueprintBuilder {
    name: String,
    model: Option<ModelType>,
    is_abstract: bool,
    declarations: IndexMap<String, Declaration>,
    after_postgeneration: Option<AfterPostgenerationFn>,
}

impl BlueprintBuilder {
    pub fn model(mut self, model: ModelType) -> Self {
        self.model = Some(model);
        self
    }

    pub fn abstract_blueprint(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Adds a declaration; declaring an attribute again replaces it in place.
    pub fn declare(mut self, attr: impl Into<String>, declaration: impl Into<Declaration>) -> Self {
        self.declarations.insert(attr.into(), declaration.into());
        self
    }

    pub fn after_postgeneration(
        mut self,
        callback: impl Fn(&Value, &IndexMap<String, Value>) -> anyhow::Result<()>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.after_postgeneration = Some(Arc::new(callback));
        self
    }

    pub fn build(self) -> Arc<Blueprint> {
        // `root__key` is context for `root` when root is not a plain value.
        let roots: HashSet<&str> = self
            .declarations
            .iter()
            .filter(|(_, declaration)| {
                !matches!(classify(declaration), DeclarationClass::Plain | DeclarationClass::Lazy)
            })
            .map(|(attr, _)| attr.as_str())
            .collect();

        let mut pre = Vec::new();
        let mut post = Vec::new();
        let mut contexts: IndexMap<String, IndexMap<String, Value>> = IndexMap::new();
        for (attr, declaration) in &self.declarations {
            if let Declaration::PostHook(hook) = declaration {
                contexts
                    .entry(attr.clone())
                    .or_default()
                    .extend(hook.context().iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        for (attr, declaration) in &self.declarations {
            if classify(declaration).is_post_construction() {
                post.push(attr.clone());
                continue;
            }
            match attr.split_once(SEPARATOR) {
                Some((root, key)) if roots.contains(root) => {
                    let default = match declaration {
                        Declaration::Plain(value) => value.clone(),
                        _ => Value::Null,
                    };
                    contexts
                        .entry(root.to_string())
                        .or_default()
                        .insert(key.to_string(), default);
                }
                _ => pre.push(attr.clone()),
            }
        }

        Arc::new(Blueprint {
            name: self.name,
            model: self.model,
            is_abstract: self.is_abstract,
            declarations: self.declarations,
            pre,
            post,
            contexts,
            after_postgeneration: self.after_postgeneration,
            sequence: AtomicU64::new(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> Arc<Blueprint> {
        Blueprint::builder("AuthorFactory")
            .model(ModelType::new("Author"))
            .declare("name", "Charles Dickens")
            .declare(
                "register_user",
                PostHook::new(|_, _, _| Ok(Value::Null)).with_context("password", "qwerty"),
            )
            .declare("register_user__password", "s3cret")
            .declare("register_user__email", "dickens@example.com")
            .declare(
                "books",
                Declaration::reverse(|| {
                    Blueprint::builder("BookFactory")
                        .model(ModelType::new("Book"))
                        .build()
                }),
            )
            .build()
    }

    #[test]
    fn splits_declarations_once() {
        let blueprint = author();
        assert_eq!(blueprint.pre_declarations(), ["name"]);
        assert_eq!(blueprint.post_declarations(), ["register_user", "books"]);
        let context = blueprint.hook_context("register_user").expect("hook context");
        assert_eq!(context.get("password"), Some(&Value::from("s3cret")));
        assert_eq!(context.get("email"), Some(&Value::from("dickens@example.com")));
    }

    #[test]
    fn nested_context_is_not_a_constructor_argument() {
        let author = author();
        let book = Blueprint::builder("BookFactory")
            .model(ModelType::new("Book"))
            .declare("title", "Bleak House")
            .declare("author", Declaration::nested(move || author.clone()))
            .declare("author__name", "Bro")
            .declare("reviews", Declaration::reverse(|| {
                Blueprint::builder("ReviewFactory").model(ModelType::new("Review")).build()
            }))
            .declare("reviews__stars", 5i64)
            .build();
        assert_eq!(book.pre_declarations(), ["title", "author"]);
        assert_eq!(book.post_declarations(), ["reviews"]);
        let context = book.hook_context("author").expect("nested context");
        assert_eq!(context.get("name"), Some(&Value::from("Bro")));
        let context = book.hook_context("reviews").expect("reverse context");
        assert_eq!(context.get("stars"), Some(&Value::Int(5)));
    }

    #[test]
    fn names_follow_type_names() {
        let blueprint = author();
        assert_eq!(blueprint.model_name().as_deref(), Some("author"));
        assert_eq!(blueprint.factory_name(), "author_factory");
    }

    #[test]
    fn create_resolves_sequences() {
        let blueprint = Blueprint::builder("UserFactory")
            .model(ModelType::new("User"))
            .build();
        let step = BuildStep { fixture: "user".into(), sequence: blueprint.next_sequence() };
        let mut kwargs = IndexMap::new();
        kwargs.insert(
            "login".to_string(),
            Value::Sequence(Sequence::new(|n| Value::Text(format!("user{n}")))),
        );
        let user = blueprint.create(&step, kwargs).expect("create user");
        let user = user.as_object().expect("object instance");
        assert_eq!(user.model(), "User");
        assert_eq!(user.get("login"), Some(Value::from("user0")));
    }

    #[test]
    fn create_without_model_fails() {
        let blueprint = Blueprint::builder("BaseFactory").abstract_blueprint().build();
        let step = BuildStep { fixture: "base".into(), sequence: 0 };
        assert!(blueprint.create(&step, IndexMap::new()).is_err());
    }
}

// src/models.rs

//! The host object model that ignite resolves commands against.
//!
//! A program hands the resolver a [`Component`]: a tagged value that can be a
//! primitive, a container, a record, an object with named members, a routine
//! (with a declared [`Signature`]) or a class (a factory for instances).
//! Shared shapes live behind `Rc` so that resolution hands out references and
//! never copies the user's graph.

use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

/// The native body of a routine. It receives the bound arguments and returns
/// the produced component, or the user's own error untouched.
pub type NativeFn = dyn Fn(CallArgs) -> anyhow::Result<Component>;

/// A user supplied rendering used in place of the default textual form.
pub type DescribeFn = dyn Fn() -> String;

// --- Identity ---

/// Stable identity of a routine or class. Used as the key of the
/// parsing-metadata registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallableId(Uuid);

impl CallableId {
    /// Allocates a fresh identity.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallableId {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a routine or class was defined, for trace and help output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<u32>,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

// --- Signatures ---

/// A single declared parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Component>,
    /// Name of the annotated type (`"int"`, `"float"`, `"bool"`, `"str"`...).
    pub annotation: Option<String>,
}

impl Param {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            default: None,
            annotation: None,
        }
    }
}

/// The signature a routine was declared with, in declaration order.
///
/// Parameters with a default must come after the ones without one.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    pub varargs: Option<String>,
    pub kwonly: Vec<Param>,
    pub varkw: Option<String>,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required positional-or-keyword parameter.
    pub fn param(mut self, name: &str) -> Self {
        debug_assert!(
            self.params.iter().all(|p| p.default.is_none()),
            "parameter '{name}' without default follows a defaulted one"
        );
        self.params.push(Param::new(name));
        self
    }

    /// Adds a positional-or-keyword parameter with a default value.
    pub fn param_default(mut self, name: &str, default: impl Into<Component>) -> Self {
        let mut param = Param::new(name);
        param.default = Some(default.into());
        self.params.push(param);
        self
    }

    /// Annotates the most recently added parameter (positional or keyword-only).
    pub fn annotated(mut self, type_name: &str) -> Self {
        let last = if self.kwonly.is_empty() {
            self.params.last_mut()
        } else {
            self.kwonly.last_mut()
        };
        if let Some(param) = last {
            param.annotation = Some(type_name.to_string());
        }
        self
    }

    pub fn varargs(mut self, name: &str) -> Self {
        self.varargs = Some(name.to_string());
        self
    }

    pub fn kwonly(mut self, name: &str) -> Self {
        self.kwonly.push(Param::new(name));
        self
    }

    pub fn kwonly_default(mut self, name: &str, default: impl Into<Component>) -> Self {
        let mut param = Param::new(name);
        param.default = Some(default.into());
        self.kwonly.push(param);
        self
    }

    pub fn varkw(mut self, name: &str) -> Self {
        self.varkw = Some(name.to_string());
        self
    }

    fn with_receiver(mut self, receiver: &str) -> Self {
        self.params.insert(0, Param::new(receiver));
        self
    }
}

// --- Call arguments ---

/// Arguments bound for a single call.
///
/// `positional[i]` was bound to `names[i]` for every declared positional
/// parameter; anything beyond `names.len()` came from the variadic slot.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: Vec<Component>,
    pub names: Vec<String>,
    pub keywords: Vec<(String, Component)>,
}

impl CallArgs {
    pub fn new(positional: Vec<Component>) -> Self {
        Self {
            positional,
            ..Self::default()
        }
    }

    /// Looks a value up by parameter name, positional bindings first.
    pub fn get(&self, name: &str) -> Option<&Component> {
        self.names
            .iter()
            .position(|n| n == name)
            .and_then(|i| self.positional.get(i))
            .or_else(|| self.keyword(name))
    }

    /// Like [`CallArgs::get`], failing with a descriptive error.
    pub fn require(&self, name: &str) -> anyhow::Result<&Component> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("missing argument '{}'", name))
    }

    pub fn keyword(&self, name: &str) -> Option<&Component> {
        self.keywords.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Values captured by the variadic positional slot.
    pub fn rest(&self) -> &[Component] {
        self.positional.get(self.names.len()..).unwrap_or(&[])
    }

    /// Keyword values that do not belong to a declared positional parameter.
    pub fn extra_keywords(&self) -> impl Iterator<Item = &(String, Component)> {
        self.keywords.iter().filter(|(k, _)| !self.names.contains(k))
    }
}

// --- Routines ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineKind {
    /// A free function.
    Function,
    /// A method bound to its receiver. The declared signature starts with `self`.
    Method,
    /// A method bound to its class. The declared signature starts with `cls`.
    ClassMethod,
    /// A native routine whose signature cannot be introspected.
    Builtin,
}

/// Anything invocable with bound arguments.
pub struct Routine {
    id: CallableId,
    pub name: String,
    pub kind: RoutineKind,
    pub signature: Option<Signature>,
    pub doc: Option<String>,
    pub source: Option<SourceLocation>,
    /// The routine this one decorates, if any.
    pub wrapped: Option<Rc<Routine>>,
    body: Rc<NativeFn>,
}

impl Routine {
    fn build(
        name: &str,
        kind: RoutineKind,
        signature: Option<Signature>,
        body: impl Fn(CallArgs) -> anyhow::Result<Component> + 'static,
    ) -> Self {
        Self {
            id: CallableId::new(),
            name: name.to_string(),
            kind,
            signature,
            doc: None,
            source: None,
            wrapped: None,
            body: Rc::new(body),
        }
    }

    pub fn function(
        name: &str,
        signature: Signature,
        body: impl Fn(CallArgs) -> anyhow::Result<Component> + 'static,
    ) -> Self {
        Self::build(name, RoutineKind::Function, Some(signature), body)
    }

    /// A bound method; `self` is prepended to the declared signature.
    pub fn method(
        name: &str,
        signature: Signature,
        body: impl Fn(CallArgs) -> anyhow::Result<Component> + 'static,
    ) -> Self {
        Self::build(
            name,
            RoutineKind::Method,
            Some(signature.with_receiver("self")),
            body,
        )
    }

    /// A method bound to its class; `cls` is prepended to the declared signature.
    pub fn class_method(
        name: &str,
        signature: Signature,
        body: impl Fn(CallArgs) -> anyhow::Result<Component> + 'static,
    ) -> Self {
        Self::build(
            name,
            RoutineKind::ClassMethod,
            Some(signature.with_receiver("cls")),
            body,
        )
    }

    /// A native routine with no introspectable signature.
    pub fn builtin(
        name: &str,
        body: impl Fn(CallArgs) -> anyhow::Result<Component> + 'static,
    ) -> Self {
        Self::build(name, RoutineKind::Builtin, None, body)
    }

    /// A decorator: the new routine takes `*args, **kwargs` and reports the
    /// signature of `inner` to introspection.
    pub fn wrapping(
        name: &str,
        inner: Rc<Self>,
        body: impl Fn(CallArgs) -> anyhow::Result<Component> + 'static,
    ) -> Self {
        let signature = Signature::new().varargs("args").varkw("kwargs");
        let mut routine = Self::build(name, inner.kind, Some(signature), body);
        if inner.kind == RoutineKind::Method {
            routine.signature = routine.signature.take().map(|s| s.with_receiver("self"));
        }
        routine.doc = inner.doc.clone();
        routine.wrapped = Some(inner);
        routine
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn with_source(mut self, file: &str, line: u32) -> Self {
        self.source = Some(SourceLocation::new(file, line));
        self
    }

    pub fn id(&self) -> CallableId {
        self.id
    }

    /// Follows the decorator chain down to the routine that declared the
    /// signature callers should see.
    pub fn innermost(&self) -> &Self {
        let mut current = self;
        while let Some(inner) = current.wrapped.as_deref() {
            current = inner;
        }
        current
    }

    pub fn call(&self, args: CallArgs) -> anyhow::Result<Component> {
        (self.body)(args)
    }
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routine")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

// --- Classes ---

pub enum ClassKind {
    /// An ordinary class. `init` is the constructor signature (with `self`);
    /// `None` means the class takes no construction arguments.
    Plain {
        init: Option<Signature>,
        factory: Rc<NativeFn>,
    },
    /// A named-tuple style record class built from its field names.
    Record { fields: Vec<String> },
}

/// A factory for instances.
pub struct Class {
    id: CallableId,
    pub name: String,
    pub kind: ClassKind,
    pub doc: Option<String>,
    pub source: Option<SourceLocation>,
    /// Class-level attributes, listed by help and completion.
    pub members: Vec<(String, Component)>,
}

impl Class {
    /// A class whose constructor takes the parameters of `init`.
    pub fn new(
        name: &str,
        init: Signature,
        factory: impl Fn(CallArgs) -> anyhow::Result<Component> + 'static,
    ) -> Self {
        Self::with_kind(
            name,
            ClassKind::Plain {
                init: Some(init.with_receiver("self")),
                factory: Rc::new(factory),
            },
        )
    }

    /// A class without a custom constructor.
    pub fn without_init(
        name: &str,
        factory: impl Fn() -> anyhow::Result<Component> + 'static,
    ) -> Self {
        Self::with_kind(
            name,
            ClassKind::Plain {
                init: None,
                factory: Rc::new(move |_| factory()),
            },
        )
    }

    pub fn record(name: &str, fields: &[&str]) -> Self {
        Self::with_kind(
            name,
            ClassKind::Record {
                fields: fields.iter().map(ToString::to_string).collect(),
            },
        )
    }

    fn with_kind(name: &str, kind: ClassKind) -> Self {
        Self {
            id: CallableId::new(),
            name: name.to_string(),
            kind,
            doc: None,
            source: None,
            members: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn with_source(mut self, file: &str, line: u32) -> Self {
        self.source = Some(SourceLocation::new(file, line));
        self
    }

    pub fn member(mut self, name: &str, value: impl Into<Component>) -> Self {
        self.members.push((name.to_string(), value.into()));
        self
    }

    pub fn id(&self) -> CallableId {
        self.id
    }

    /// Creates an instance from already bound arguments.
    pub fn instantiate(&self, args: CallArgs) -> anyhow::Result<Component> {
        match &self.kind {
            ClassKind::Plain { factory, .. } => factory(args),
            ClassKind::Record { fields } => {
                let values = fields
                    .iter()
                    .map(|field| args.get(field).cloned().unwrap_or(Component::None))
                    .collect::<Vec<_>>();
                Ok(Component::Record(Rc::new(Record::new(
                    &self.name,
                    fields.iter().cloned().zip(values).collect(),
                ))))
            }
        }
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("members", &self.members.len())
            .finish_non_exhaustive()
    }
}

// --- Objects and records ---

/// An instance with named members, an optional call operator and an
/// optional custom textual form.
pub struct Object {
    pub class_name: String,
    pub doc: Option<String>,
    pub members: Vec<(String, Component)>,
    /// The call operator. Declared like a method (its signature starts with `self`).
    pub call: Option<Rc<Routine>>,
    describe: Option<Rc<DescribeFn>>,
}

impl Object {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            doc: None,
            members: Vec::new(),
            call: None,
            describe: None,
        }
    }

    pub fn member(mut self, name: &str, value: impl Into<Component>) -> Self {
        self.members.push((name.to_string(), value.into()));
        self
    }

    pub fn callable(mut self, call: Routine) -> Self {
        self.call = Some(Rc::new(call));
        self
    }

    pub fn describe(mut self, describe: impl Fn() -> String + 'static) -> Self {
        self.describe = Some(Rc::new(describe));
        self
    }

    pub fn with_doc(mut self, doc: &str) -> Self {
        self.doc = Some(doc.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.members.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn has_custom_str(&self) -> bool {
        self.describe.is_some()
    }

    pub fn custom_str(&self) -> Option<String> {
        self.describe.as_ref().map(|describe| describe())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class_name", &self.class_name)
            .field(
                "members",
                &self.members.iter().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("callable", &self.call.is_some())
            .finish_non_exhaustive()
    }
}

/// A named-tuple style value: indexable by position, addressable by field.
#[derive(Debug, Clone)]
pub struct Record {
    pub type_name: String,
    pub fields: Vec<(String, Component)>,
}

impl Record {
    pub fn new(type_name: &str, fields: Vec<(String, Component)>) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Component> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

// --- Components ---

/// A value in the user's component graph.
#[derive(Clone)]
pub enum Component {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(f64, f64),
    Ellipsis,
    NotImplemented,
    Str(String),
    List(Rc<Vec<Component>>),
    Tuple(Rc<Vec<Component>>),
    Set(Rc<Vec<Component>>),
    Dict(Rc<Vec<(Component, Component)>>),
    Record(Rc<Record>),
    Object(Rc<Object>),
    Routine(Rc<Routine>),
    Class(Rc<Class>),
}

impl Component {
    pub fn list(items: Vec<Self>) -> Self {
        Self::List(Rc::new(items))
    }

    pub fn tuple(items: Vec<Self>) -> Self {
        Self::Tuple(Rc::new(items))
    }

    /// Builds a set, dropping duplicates while keeping first-seen order.
    pub fn set(items: Vec<Self>) -> Self {
        let mut unique: Vec<Self> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.contains(&item) {
                unique.push(item);
            }
        }
        Self::Set(Rc::new(unique))
    }

    /// Builds a dict; a repeated key keeps its first position and last value.
    pub fn dict(entries: Vec<(Self, Self)>) -> Self {
        let mut unique: Vec<(Self, Self)> = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            match unique.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = value,
                None => unique.push((key, value)),
            }
        }
        Self::Dict(Rc::new(unique))
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::Str(value.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Truthiness of the value.
    pub fn truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Complex(re, im) => *re != 0.0 || *im != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) | Self::Tuple(items) | Self::Set(items) => !items.is_empty(),
            Self::Dict(entries) => !entries.is_empty(),
            Self::Record(record) => !record.fields.is_empty(),
            _ => true,
        }
    }

    /// Name of the value's type, as shown in help and usage output.
    pub fn type_name(&self) -> String {
        match self {
            Self::None => "NoneType".to_string(),
            Self::Bool(_) => "bool".to_string(),
            Self::Int(_) => "int".to_string(),
            Self::Float(_) => "float".to_string(),
            Self::Complex(..) => "complex".to_string(),
            Self::Ellipsis => "ellipsis".to_string(),
            Self::NotImplemented => "NotImplementedType".to_string(),
            Self::Str(_) => "str".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Tuple(_) => "tuple".to_string(),
            Self::Set(_) => "set".to_string(),
            Self::Dict(_) => "dict".to_string(),
            Self::Record(record) => record.type_name.clone(),
            Self::Object(object) => object.class_name.clone(),
            Self::Routine(routine) => match routine.kind {
                RoutineKind::Method | RoutineKind::ClassMethod => "method".to_string(),
                RoutineKind::Builtin => "builtin_function_or_method".to_string(),
                RoutineKind::Function => "function".to_string(),
            },
            Self::Class(_) => "type".to_string(),
        }
    }

    /// True when both sides are the same value: shared shapes compare by
    /// identity, primitives by value.
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b))
            | (Self::Tuple(a), Self::Tuple(b))
            | (Self::Set(a), Self::Set(b)) => Rc::ptr_eq(a, b),
            (Self::Dict(a), Self::Dict(b)) => Rc::ptr_eq(a, b),
            (Self::Record(a), Self::Record(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Routine(a), Self::Routine(b)) => Rc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Rc::ptr_eq(a, b),
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }

    /// The developer-facing textual form (quoted strings, `Point(x=1)`...).
    pub fn repr(&self) -> String {
        match self {
            Self::Str(s) => quote_repr(s),
            Self::Record(record) => {
                let fields = record
                    .fields
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{}({})", record.type_name, fields)
            }
            _ => self.to_string(),
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None)
            | (Self::Ellipsis, Self::Ellipsis)
            | (Self::NotImplemented, Self::NotImplemented) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Complex(a, b), Self::Complex(c, d)) => a == c && b == d,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a.len() == b.len() && a.iter().all(|x| b.contains(x)),
            (Self::Dict(a), Self::Dict(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Self::Record(a), Self::Record(b)) => {
                Rc::ptr_eq(a, b) || (a.type_name == b.type_name && a.fields == b.fields)
            }
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Routine(a), Self::Routine(b)) => Rc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// --- Textual forms ---

/// Renders a float the way users of dynamic languages expect: `4.0`,
/// `0.25`, `1e+16`, `inf`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude != 0.0 && !(1e-4..1e16).contains(&magnitude) {
        let raw = format!("{:e}", value);
        return match raw.split_once('e') {
            Some((mantissa, exponent)) => {
                let (sign, digits) = match exponent.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exponent),
                };
                format!("{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => raw,
        };
    }
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

fn format_imag(value: f64) -> String {
    let text = format_float(value);
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

fn quote_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn join_repr(items: &[Component]) -> String {
    items
        .iter()
        .map(Component::repr)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Bool(true) => write!(f, "True"),
            Self::Bool(false) => write!(f, "False"),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", format_float(*x)),
            Self::Complex(re, im) if *re == 0.0 && re.is_sign_positive() => {
                write!(f, "{}j", format_imag(*im))
            }
            Self::Complex(re, im) => {
                let sign = if im.is_sign_negative() { '-' } else { '+' };
                write!(
                    f,
                    "({}{}{}j)",
                    format_imag(*re),
                    sign,
                    format_imag(im.abs())
                )
            }
            Self::Ellipsis => write!(f, "Ellipsis"),
            Self::NotImplemented => write!(f, "NotImplemented"),
            Self::Str(s) => write!(f, "{}", s),
            Self::List(items) => write!(f, "[{}]", join_repr(items)),
            Self::Tuple(items) if items.len() == 1 => write!(f, "({},)", join_repr(items)),
            Self::Tuple(items) => write!(f, "({})", join_repr(items)),
            Self::Set(items) if items.is_empty() => write!(f, "set()"),
            Self::Set(items) => write!(f, "{{{}}}", join_repr(items)),
            Self::Dict(entries) => {
                let body = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(), v.repr()))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{{{}}}", body)
            }
            Self::Record(_) => write!(f, "{}", self.repr()),
            Self::Object(object) => match object.custom_str() {
                Some(text) => write!(f, "{}", text),
                None => write!(f, "<{} object>", object.class_name),
            },
            Self::Routine(routine) => match routine.kind {
                RoutineKind::Method | RoutineKind::ClassMethod => {
                    write!(f, "<bound method {}>", routine.name)
                }
                RoutineKind::Builtin => write!(f, "<built-in function {}>", routine.name),
                RoutineKind::Function => write!(f, "<function {}>", routine.name),
            },
            Self::Class(class) => write!(f, "<class '{}'>", class.name),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repr())
    }
}

// --- Conversions ---

impl From<()> for Component {
    fn from(_: ()) -> Self {
        Self::None
    }
}

impl From<bool> for Component {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Component {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Component {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Component {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Component {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Component {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Self>> for Component {
    fn from(items: Vec<Self>) -> Self {
        Self::list(items)
    }
}

impl<T: Into<Self>> From<Option<T>> for Component {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

impl From<Routine> for Component {
    fn from(routine: Routine) -> Self {
        Self::Routine(Rc::new(routine))
    }
}

impl From<Rc<Routine>> for Component {
    fn from(routine: Rc<Routine>) -> Self {
        Self::Routine(routine)
    }
}

impl From<Class> for Component {
    fn from(class: Class) -> Self {
        Self::Class(Rc::new(class))
    }
}

impl From<Object> for Component {
    fn from(object: Object) -> Self {
        Self::Object(Rc::new(object))
    }
}

impl From<Record> for Component {
    fn from(record: Record) -> Self {
        Self::Record(Rc::new(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_rendering() {
        assert_eq!(format_float(4.0), "4.0");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(-3.5), "-3.5");
        assert_eq!(format_float(1e16), "1e+16");
        assert_eq!(format_float(1.5e-7), "1.5e-07");
        assert_eq!(format_float(f64::INFINITY), "inf");
    }

    #[test]
    fn test_display_and_repr() {
        let list = Component::list(vec![1.into(), "two".into(), Component::None]);
        assert_eq!(list.to_string(), "[1, 'two', None]");
        assert_eq!(Component::tuple(vec![1.into()]).to_string(), "(1,)");
        assert_eq!(Component::set(vec![]).to_string(), "set()");
        assert_eq!(Component::Complex(0.0, 2.0).to_string(), "2j");
        assert_eq!(Component::Complex(1.0, -2.0).to_string(), "(1-2j)");
        assert_eq!(Component::from("it's").repr(), "\"it's\"");
        let dict = Component::dict(vec![("a".into(), 1.into())]);
        assert_eq!(dict.to_string(), "{'a': 1}");
        let record = Record::new("Point", vec![("x".into(), 1.into()), ("y".into(), 2.into())]);
        assert_eq!(Component::from(record).to_string(), "Point(x=1, y=2)");
    }

    #[test]
    fn test_identity_versus_equality() {
        let a = Component::list(vec![1.into()]);
        let b = Component::list(vec![1.into()]);
        assert_eq!(a, b);
        assert!(!a.is_same(&b));
        assert!(a.is_same(&a.clone()));
        assert!(Component::Int(3).is_same(&Component::Int(3)));
        assert_eq!(Component::Int(1), Component::Float(1.0));
    }

    #[test]
    fn test_set_and_dict_dedupe() {
        let set = Component::set(vec![1.into(), 1.into(), 2.into()]);
        assert_eq!(set.to_string(), "{1, 2}");
        let dict = Component::dict(vec![
            ("a".into(), 1.into()),
            ("b".into(), 2.into()),
            ("a".into(), 3.into()),
        ]);
        assert_eq!(dict.to_string(), "{'a': 3, 'b': 2}");
    }

    #[test]
    fn test_call_args_lookup() {
        let args = CallArgs {
            positional: vec![1.into(), 2.into(), 3.into()],
            names: vec!["a".into(), "b".into()],
            keywords: vec![("c".into(), "x".into())],
        };
        assert_eq!(args.get("b"), Some(&Component::Int(2)));
        assert_eq!(args.get("c"), Some(&Component::from("x")));
        assert_eq!(args.rest(), &[Component::Int(3)]);
        assert!(args.require("missing").is_err());
    }

    #[test]
    fn test_wrapping_keeps_inner_routine() {
        let inner = Rc::new(
            Routine::function("double", Signature::new().param("count"), |args| {
                Ok(args.require("count")?.clone())
            })
            .with_doc("Doubles."),
        );
        let outer = Routine::wrapping("decorated", inner.clone(), |_| Ok(Component::None));
        assert_eq!(outer.innermost().name, "double");
        assert_eq!(outer.doc.as_deref(), Some("Doubles."));
    }

    #[test]
    fn test_record_class_instantiation() {
        let class = Class::record("Point", &["x", "y"]);
        let args = CallArgs {
            positional: vec![1.into(), 2.into()],
            names: vec!["x".into(), "y".into()],
            keywords: vec![],
        };
        let point = class.instantiate(args).unwrap();
        assert_eq!(point.to_string(), "Point(x=1, y=2)");
    }
}

//! Metadata descriptors referenced by instruction operands.
//!
//! These are lightweight, owned descriptions of the things an instruction
//! can point at. They carry just enough to render a readable trace and to
//! intern a token; resolving them against real metadata is the writer's job.

use std::fmt;

/// A type, identified by its full name (`System.Int32`, `Demo.Point[]`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeRef {
    full_name: String,
}

impl TypeRef {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Simple name, without namespace.
    pub fn name(&self) -> &str {
        self.full_name
            .rsplit_once('.')
            .map_or(self.full_name.as_str(), |(_, name)| name)
    }

    /// Namespace, if the full name has one.
    pub fn namespace(&self) -> Option<&str> {
        self.full_name.rsplit_once('.').map(|(ns, _)| ns)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// Render a parameter type list as `(A, B, C)`.
pub fn describe_types(types: &[TypeRef]) -> String {
    let names: Vec<&str> = types.iter().map(TypeRef::full_name).collect();
    format!("({})", names.join(", "))
}

/// A method or constructor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub declaring_type: TypeRef,
    pub name: String,
    pub return_type: TypeRef,
    pub params: Vec<TypeRef>,
    pub is_static: bool,
}

impl MethodRef {
    pub fn new(
        declaring_type: TypeRef,
        name: impl Into<String>,
        return_type: TypeRef,
        params: Vec<TypeRef>,
    ) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            return_type,
            params,
            is_static: false,
        }
    }

    /// Instance constructor of `declaring_type`.
    pub fn constructor(declaring_type: TypeRef, params: Vec<TypeRef>) -> Self {
        Self::new(declaring_type, ".ctor", TypeRef::new("System.Void"), params)
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.name == ".ctor" || self.name == ".cctor"
    }

    /// `static System.Void Demo.Program::Main(System.String[])`
    pub fn full_description(&self) -> String {
        let prefix = if self.is_static { "static " } else { "" };
        format!(
            "{prefix}{} {}::{}{}",
            self.return_type,
            self.declaring_type,
            self.name,
            describe_types(&self.params)
        )
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_description())
    }
}

/// A field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub declaring_type: TypeRef,
    pub name: String,
    pub field_type: TypeRef,
    pub is_static: bool,
}

impl FieldRef {
    pub fn new(declaring_type: TypeRef, name: impl Into<String>, field_type: TypeRef) -> Self {
        Self {
            declaring_type,
            name: name.into(),
            field_type,
            is_static: false,
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_static {
            f.write_str("static ")?;
        }
        write!(f, "{} {}::{}", self.field_type, self.declaring_type, self.name)
    }
}

/// Managed calling convention kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CallKind {
    #[default]
    Standard,
    VarArgs,
    Any,
}

/// Managed calling convention, as used by `calli` and standalone signatures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CallingConventions {
    pub kind: CallKind,
    pub has_this: bool,
    pub explicit_this: bool,
}

impl CallingConventions {
    pub const STANDARD: Self = Self {
        kind: CallKind::Standard,
        has_this: false,
        explicit_this: false,
    };

    pub const VARARGS: Self = Self {
        kind: CallKind::VarArgs,
        has_this: false,
        explicit_this: false,
    };

    pub fn with_this(mut self) -> Self {
        self.has_this = true;
        self
    }
}

impl fmt::Display for CallingConventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            CallKind::Standard => "Standard",
            CallKind::VarArgs => "VarArgs",
            CallKind::Any => "Any",
        };
        f.write_str(kind)?;
        if self.has_this {
            f.write_str(", HasThis")?;
        }
        if self.explicit_this {
            f.write_str(", ExplicitThis")?;
        }
        Ok(())
    }
}

/// Unmanaged calling convention for `calli` into native code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnmanagedCallConv {
    Winapi,
    Cdecl,
    StdCall,
    ThisCall,
    FastCall,
}

impl fmt::Display for UnmanagedCallConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Winapi => "Winapi",
            Self::Cdecl => "Cdecl",
            Self::StdCall => "StdCall",
            Self::ThisCall => "ThisCall",
            Self::FastCall => "FastCall",
        };
        f.write_str(name)
    }
}

/// Either flavour of calling convention.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CallConv {
    Managed(CallingConventions),
    Unmanaged(UnmanagedCallConv),
}

impl fmt::Display for CallConv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Managed(conv) => fmt::Display::fmt(conv, f),
            Self::Unmanaged(conv) => fmt::Display::fmt(conv, f),
        }
    }
}

/// A standalone call-site signature blob.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    pub call_conv: CallConv,
    pub return_type: TypeRef,
    pub params: Vec<TypeRef>,
}

impl Signature {
    pub fn new(call_conv: CallConv, return_type: TypeRef, params: Vec<TypeRef>) -> Self {
        Self {
            call_conv,
            return_type,
            params,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.call_conv,
            self.return_type,
            describe_types(&self.params)
        )
    }
}

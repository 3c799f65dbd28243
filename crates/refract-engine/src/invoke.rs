//! Reflective construction, invocation and field access
//!
//! Every entry point checks visibility first, then arguments and receiver,
//! and only then performs the effect. Bodies run synchronously on the
//! caller's thread and see the call through an [`Invocation`].

use std::sync::Arc;

use tracing::trace;

use crate::access::{check_access, denied, token_grants, AccessToken};
use crate::error::{ReflectError, ReflectResult, TargetError};
use crate::introspection::is_subtype_named;
use crate::metadata::{
    ConstructorDescriptor, FieldDescriptor, Member, MethodDescriptor, Parameterized, TypeDescriptor,
};
use crate::natives::Body;
use crate::registry::TypeRegistry;
use crate::types::{format_signature, TypeRef, STRING_TYPE};
use crate::value::{Instance, ObjectRef, Value};

/// Performs construction, invocation and field access against a registry
#[derive(Debug, Clone)]
pub struct InvocationEngine {
    registry: Arc<TypeRegistry>,
}

impl InvocationEngine {
    /// Create an engine over `registry`
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// The registry types are resolved from
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Create a new instance through `ctor`.
    ///
    /// Slots across the whole chain start at their declared initial value
    /// (or the zero value of their type) before the body runs.
    pub fn construct(
        &self,
        ctor: &ConstructorDescriptor,
        args: &[Value],
        token: Option<&AccessToken>,
    ) -> ReflectResult<ObjectRef> {
        check_access(ctor, token)?;
        let owner = ctor.owner()?;
        if owner.is_interface() {
            return Err(instantiation(&owner, "type is an interface", None));
        }
        if owner.modifiers().is_abstract() {
            return Err(instantiation(&owner, "type is abstract", None));
        }
        self.check_arguments(ctor, args)?;

        let obj = Instance::allocate(owner.clone(), owner.instance_template().to_vec());
        trace!(ctor = %ctor.describe(), instance = obj.id(), "constructing");
        self.run_constructor(ctor, &owner, &obj, args)?;
        Ok(obj)
    }

    /// Resolve `type_name` and run its public no-argument constructor
    pub fn new_instance(&self, type_name: &str) -> ReflectResult<ObjectRef> {
        let ty = self.registry.resolve(type_name)?;
        let ctor = ty.find_constructor(&[])?;
        self.construct(ctor, &[], None)
    }

    /// Invoke `method` on `receiver`.
    ///
    /// Static methods ignore the receiver. Non-private instance methods run
    /// the most-derived implementation along the receiver's supertype chain.
    pub fn invoke(
        &self,
        method: &MethodDescriptor,
        receiver: Option<&ObjectRef>,
        args: &[Value],
        token: Option<&AccessToken>,
    ) -> ReflectResult<Value> {
        check_access(method, token)?;
        self.check_arguments(method, args)?;
        self.dispatch(method, receiver, args)
    }

    /// Read `field`; static fields ignore the receiver
    pub fn get_field(
        &self,
        field: &FieldDescriptor,
        receiver: Option<&ObjectRef>,
        token: Option<&AccessToken>,
    ) -> ReflectResult<Value> {
        check_access(field, token)?;
        if field.is_static() {
            return Ok(field.owner()?.read_static(field.slot()));
        }
        let obj = self.receiver_for(field, receiver)?;
        Ok(obj.read_slot(field.slot()))
    }

    /// Write `field`.
    ///
    /// Final fields need a token even when public, and static final fields
    /// can never be written.
    pub fn set_field(
        &self,
        field: &FieldDescriptor,
        receiver: Option<&ObjectRef>,
        value: Value,
        token: Option<&AccessToken>,
    ) -> ReflectResult<()> {
        check_access(field, token)?;
        if field.modifiers().is_final() && (field.is_static() || !token_grants(field, token)) {
            return Err(denied(field));
        }
        self.check_value(field, field.field_type(), &value)?;
        if field.is_static() {
            field.owner()?.write_static(field.slot(), value);
            return Ok(());
        }
        let obj = self.receiver_for(field, receiver)?;
        obj.write_slot(field.slot(), value);
        Ok(())
    }

    /// Whether `value` may be passed where `ty` is expected.
    ///
    /// Primitives match exactly, `null` fits any reference type and an
    /// object fits every type in its supertype chain or interface closure.
    pub fn conforms(&self, ty: &TypeRef, value: &Value) -> bool {
        match (ty, value) {
            (TypeRef::Void, Value::Void) => true,
            (TypeRef::Boolean, Value::Bool(_)) => true,
            (TypeRef::Int, Value::Int(_)) => true,
            (TypeRef::Long, Value::Long(_)) => true,
            (TypeRef::Double, Value::Double(_)) => true,
            (TypeRef::String | TypeRef::Named(_), Value::Null) => true,
            (TypeRef::String, Value::Str(_)) => true,
            (TypeRef::Named(name), Value::Str(_)) => {
                name == STRING_TYPE || name == self.registry.root_name()
            }
            (TypeRef::Named(name), Value::Object(obj)) => {
                is_subtype_named(obj.type_descriptor(), name)
            }
            _ => false,
        }
    }

    fn check_arguments<M: Parameterized + ?Sized>(
        &self,
        member: &M,
        args: &[Value],
    ) -> ReflectResult<()> {
        let params = member.parameter_types();
        if params.len() != args.len() {
            return Err(ReflectError::mismatch(
                member.describe(),
                format!("expected {} arguments, got {}", params.len(), args.len()),
            ));
        }
        for (index, (param, arg)) in params.iter().zip(args).enumerate() {
            if !self.conforms(param, arg) {
                return Err(ReflectError::mismatch(
                    member.describe(),
                    format!("argument {} expects {}, got {}", index, param, arg.type_label()),
                ));
            }
        }
        Ok(())
    }

    fn check_value<M: Member + ?Sized>(
        &self,
        member: &M,
        ty: &TypeRef,
        value: &Value,
    ) -> ReflectResult<()> {
        if self.conforms(ty, value) {
            return Ok(());
        }
        Err(ReflectError::mismatch(
            member.describe(),
            format!("expected {}, got {}", ty, value.type_label()),
        ))
    }

    /// The receiver of an instance member, checked against the owner
    fn receiver_for<'r, M: Member + ?Sized>(
        &self,
        member: &M,
        receiver: Option<&'r ObjectRef>,
    ) -> ReflectResult<&'r ObjectRef> {
        let obj = receiver.ok_or_else(|| {
            ReflectError::mismatch(member.describe(), "instance member requires a receiver")
        })?;
        if !is_subtype_named(obj.type_descriptor(), member.owner_name()) {
            return Err(ReflectError::mismatch(
                member.describe(),
                format!(
                    "receiver of type {} is not an instance of {}",
                    obj.type_name(),
                    member.owner_name()
                ),
            ));
        }
        Ok(obj)
    }

    fn dispatch(
        &self,
        method: &MethodDescriptor,
        receiver: Option<&ObjectRef>,
        args: &[Value],
    ) -> ReflectResult<Value> {
        if method.is_static() {
            return self.run_method(method, None, args);
        }
        let obj = self.receiver_for(method, receiver)?;
        if method.modifiers().is_private() {
            return self.run_method(method, Some(obj), args);
        }

        let target = obj
            .type_descriptor()
            .ancestors()
            .flat_map(|ty| ty.declared_methods())
            .find(|m| {
                !m.is_abstract()
                    && !m.is_static()
                    && !m.modifiers().is_private()
                    && m.same_signature(method)
            })
            .ok_or_else(|| ReflectError::AbstractMethod {
                member: method.describe(),
                receiver: obj.type_name().to_string(),
            })?;

        trace!(
            method = %method.describe(),
            target = %target.describe(),
            receiver = obj.id(),
            "dispatch"
        );
        self.run_method(target, Some(obj), args)
    }

    fn run_method(
        &self,
        method: &MethodDescriptor,
        this: Option<&ObjectRef>,
        args: &[Value],
    ) -> ReflectResult<Value> {
        let owner = method.owner()?;
        let value = self
            .run_body(method.body(), method, &owner, this, args, false)?
            .map_err(|cause| ReflectError::InvocationTarget {
                member: method.describe(),
                cause,
            })?;

        let ret = method.return_type();
        if *ret == TypeRef::Void {
            return Ok(Value::Void);
        }
        let value = match value {
            Value::Void => Value::zero(ret),
            other => other,
        };
        if !self.conforms(ret, &value) {
            return Err(ReflectError::mismatch(
                method.describe(),
                format!("body returned {}, declared {}", value.type_label(), ret),
            ));
        }
        Ok(value)
    }

    fn run_constructor(
        &self,
        ctor: &ConstructorDescriptor,
        owner: &TypeDescriptor,
        this: &ObjectRef,
        args: &[Value],
    ) -> ReflectResult<()> {
        self.run_body(ctor.body(), ctor, owner, Some(this), args, true)?
            .map(|_| ())
            .map_err(|cause| instantiation(owner, "constructor body failed", Some(cause)))
    }

    /// Outer error: the engine could not run the body. Inner error: the
    /// body itself failed.
    fn run_body(
        &self,
        body: &Body,
        member: &dyn Member,
        owner: &TypeDescriptor,
        this: Option<&ObjectRef>,
        args: &[Value],
        constructing: bool,
    ) -> ReflectResult<Result<Value, TargetError>> {
        match body {
            Body::Empty => Ok(Ok(Value::Void)),
            Body::Named(_) => Err(ReflectError::UnboundBody {
                member: member.describe(),
            }),
            Body::Native(f) => {
                let mut invocation = Invocation {
                    engine: self,
                    owner,
                    member,
                    this,
                    args,
                    constructing,
                };
                Ok(f(&mut invocation))
            }
        }
    }
}

fn instantiation(ty: &TypeDescriptor, message: &str, cause: Option<TargetError>) -> ReflectError {
    ReflectError::InstantiationFailure {
        type_name: ty.name().to_string(),
        message: message.to_string(),
        cause,
    }
}

/// The context a constructor or method body runs in.
///
/// Field and method access through the context is privileged: the body
/// belongs to the declaring type, so its private members are reachable.
pub struct Invocation<'a> {
    engine: &'a InvocationEngine,
    owner: &'a TypeDescriptor,
    member: &'a dyn Member,
    this: Option<&'a ObjectRef>,
    args: &'a [Value],
    /// Set while a constructor body runs
    constructing: bool,
}

impl<'a> Invocation<'a> {
    /// The engine running this body
    pub fn engine(&self) -> &'a InvocationEngine {
        self.engine
    }

    /// Type declaring the running body
    pub fn owner(&self) -> &'a TypeDescriptor {
        self.owner
    }

    /// The running constructor or method
    pub fn member(&self) -> &'a dyn Member {
        self.member
    }

    /// The receiver; fails inside static methods
    pub fn this(&self) -> ReflectResult<&'a ObjectRef> {
        self.this
            .ok_or_else(|| {
                ReflectError::mismatch(self.member.describe(), "static body has no receiver")
            })
    }

    /// Positional arguments
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Argument at `index`
    pub fn arg(&self, index: usize) -> ReflectResult<&'a Value> {
        self.args.get(index).ok_or_else(|| {
            ReflectError::mismatch(
                self.member.describe(),
                format!("no argument at index {}", index),
            )
        })
    }

    /// String argument at `index`; `None` for a null argument
    pub fn arg_str(&self, index: usize) -> ReflectResult<Option<&'a str>> {
        match self.arg(index)? {
            Value::Null => Ok(None),
            Value::Str(s) => Ok(Some(s)),
            other => Err(self.wrong_arg(index, "String", other)),
        }
    }

    /// Boolean argument at `index`
    pub fn arg_bool(&self, index: usize) -> ReflectResult<bool> {
        let value = self.arg(index)?;
        value.as_bool().ok_or_else(|| self.wrong_arg(index, "boolean", value))
    }

    /// Int argument at `index`
    pub fn arg_int(&self, index: usize) -> ReflectResult<i32> {
        let value = self.arg(index)?;
        value.as_int().ok_or_else(|| self.wrong_arg(index, "int", value))
    }

    /// Long argument at `index`
    pub fn arg_long(&self, index: usize) -> ReflectResult<i64> {
        let value = self.arg(index)?;
        value.as_long().ok_or_else(|| self.wrong_arg(index, "long", value))
    }

    /// Double argument at `index`
    pub fn arg_double(&self, index: usize) -> ReflectResult<f64> {
        let value = self.arg(index)?;
        value.as_double().ok_or_else(|| self.wrong_arg(index, "double", value))
    }

    fn wrong_arg(&self, index: usize, expected: &str, got: &Value) -> ReflectError {
        ReflectError::mismatch(
            self.member.describe(),
            format!("argument {} is {}, not {}", index, got.type_label(), expected),
        )
    }

    /// Read a field of the owner (or a non-private inherited one)
    pub fn get(&self, name: &str) -> ReflectResult<Value> {
        let field = self.field(name)?;
        if field.is_static() {
            return Ok(field.owner()?.read_static(field.slot()));
        }
        Ok(self.this()?.read_slot(field.slot()))
    }

    /// Write a field of the owner (or a non-private inherited one).
    ///
    /// Final fields are assignable here.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ReflectResult<()> {
        let field = self.field(name)?;
        let value = value.into();
        self.engine.check_value(field, field.field_type(), &value)?;
        if field.is_static() {
            field.owner()?.write_static(field.slot(), value);
        } else {
            self.this()?.write_slot(field.slot(), value);
        }
        Ok(())
    }

    fn field(&self, name: &str) -> ReflectResult<&'a FieldDescriptor> {
        let owner_name = self.owner.name();
        self.owner
            .ancestors()
            .flat_map(|ty| ty.declared_fields())
            .find(|f| {
                f.name() == name && (f.owner_name() == owner_name || !f.modifiers().is_private())
            })
            .ok_or_else(|| ReflectError::MemberNotFound {
                owner: owner_name.to_string(),
                member: name.to_string(),
                signature: String::new(),
            })
    }

    /// Run a supertype constructor on the instance under construction.
    ///
    /// Only constructor bodies may chain; a method body gets
    /// `InvalidDeclaration`.
    pub fn super_construct(&self, signature: &[TypeRef], args: &[Value]) -> ReflectResult<()> {
        if !self.constructing {
            return Err(ReflectError::invalid(
                self.owner.name(),
                format!(
                    "{} calls a super constructor outside a constructor",
                    self.member.describe()
                ),
            ));
        }
        let this = self.this()?;
        let sup = self.owner.supertype().ok_or_else(|| ReflectError::MemberNotFound {
            owner: self.owner.name().to_string(),
            member: "super".to_string(),
            signature: format_signature(signature),
        })?;
        let ctor = sup.find_constructor(signature)?;
        if ctor.modifiers().is_private() {
            return Err(denied(ctor));
        }
        self.engine.check_arguments(ctor, args)?;
        self.engine.run_constructor(ctor, sup, this, args)
    }

    /// Call a method visible from the owner on the current receiver.
    ///
    /// The method is looked up from the owner upwards; non-private
    /// instance methods still dispatch on the receiver's runtime type.
    pub fn call(&self, name: &str, signature: &[TypeRef], args: &[Value]) -> ReflectResult<Value> {
        let owner_name = self.owner.name();
        let method = self
            .owner
            .ancestors()
            .flat_map(|ty| ty.declared_methods())
            .find(|m| {
                m.name() == name
                    && m.parameter_types() == signature
                    && (m.owner_name() == owner_name || !m.modifiers().is_private())
            })
            .ok_or_else(|| ReflectError::MemberNotFound {
                owner: owner_name.to_string(),
                member: name.to_string(),
                signature: format_signature(signature),
            })?;
        self.engine.check_arguments(method, args)?;
        self.engine.dispatch(method, self.this, args)
    }
}

impl std::fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invocation")
            .field("member", &self.member.describe())
            .field("this", &self.this.map(|o| o.id()))
            .field("args", &self.args)
            .field("constructing", &self.constructing)
            .finish()
    }
}

//! Integration tests for the reflection engine
//!
//! Uses a small zoo: an abstract `Animal` implementing `Eating`, with `Bird`
//! and `Goat` below it and `Goat` additionally implementing `Locomotion`.

use std::fmt;
use std::sync::{Arc, Barrier};
use std::thread;

use refract_engine::introspection::{all_interfaces, hierarchy, public_constructors};
use refract_engine::{
    override_access, ConstructorDecl, FieldDecl, InvocationEngine, Member, MethodDecl, Modifiers,
    ReflectError, TypeDeclaration, TypeRef, TypeRegistry, Value, STRING_TYPE,
};

const ANIMAL: &str = "com.lou.reflect.test.Animal";
const BIRD: &str = "com.lou.reflect.test.Bird";
const GOAT: &str = "com.lou.reflect.test.Goat";
const EATING: &str = "com.lou.reflect.test.Eating";
const LOCOMOTION: &str = "com.lou.reflect.test.Locomotion";
const PERSON: &str = "com.lou.reflect.test.model.Person";

#[derive(Debug)]
struct Tantrum(&'static str);

impl fmt::Display for Tantrum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tantrum: {}", self.0)
    }
}

impl std::error::Error for Tantrum {}

fn public() -> Modifiers {
    Modifiers::PUBLIC
}

fn zoo() -> Vec<TypeDeclaration> {
    vec![
        TypeDeclaration::interface(EATING).method(MethodDecl::new("eats", [], TypeRef::String)),
        TypeDeclaration::interface(LOCOMOTION)
            .method(MethodDecl::new("getLocomotion", [], TypeRef::String)),
        TypeDeclaration::class(ANIMAL)
            .modifiers(Modifiers::PUBLIC | Modifiers::ABSTRACT)
            .implements(EATING)
            .field(
                FieldDecl::new("CATEGORY", TypeRef::String)
                    .modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
                    .initial("domestic"),
            )
            .field(FieldDecl::new("name", TypeRef::String).modifiers(Modifiers::PRIVATE))
            .constructor(
                ConstructorDecl::new([TypeRef::String])
                    .modifiers(public())
                    .body(|inv| {
                        let name = inv.arg(0)?.clone();
                        inv.set("name", name)?;
                        Ok(Value::Void)
                    }),
            )
            .method(
                MethodDecl::new("getSound", [], TypeRef::String)
                    .modifiers(Modifiers::PROTECTED | Modifiers::ABSTRACT),
            )
            .method(
                MethodDecl::new("getName", [], TypeRef::String)
                    .modifiers(public())
                    .body(|inv| Ok(inv.get("name")?)),
            )
            .method(
                MethodDecl::new("setName", [TypeRef::String], TypeRef::Void)
                    .modifiers(public())
                    .body(|inv| {
                        let name = inv.arg(0)?.clone();
                        inv.set("name", name)?;
                        Ok(Value::Void)
                    }),
            ),
        TypeDeclaration::class(BIRD)
            .extends(ANIMAL)
            .modifiers(public())
            .field(FieldDecl::new("walks", TypeRef::Boolean).modifiers(Modifiers::PRIVATE))
            .constructor(ConstructorDecl::new([]).modifiers(public()).body(|inv| {
                inv.super_construct(&[TypeRef::String], &[Value::from("bird-default")])?;
                Ok(Value::Void)
            }))
            .constructor(
                ConstructorDecl::new([TypeRef::String])
                    .modifiers(public())
                    .body(|inv| {
                        inv.super_construct(&[TypeRef::String], &[inv.arg(0)?.clone()])?;
                        Ok(Value::Void)
                    }),
            )
            .constructor(
                ConstructorDecl::new([TypeRef::String, TypeRef::Boolean])
                    .modifiers(public())
                    .body(|inv| {
                        inv.super_construct(&[TypeRef::String], &[inv.arg(0)?.clone()])?;
                        inv.set("walks", inv.arg_bool(1)?)?;
                        Ok(Value::Void)
                    }),
            )
            .method(
                MethodDecl::new("getSound", [], TypeRef::String)
                    .modifiers(Modifiers::PROTECTED)
                    .body(|_| Ok(Value::Null)),
            )
            .method(
                MethodDecl::new("eats", [], TypeRef::String)
                    .modifiers(public())
                    .body(|_| Ok(Value::Null)),
            )
            .method(
                MethodDecl::new("isWalks", [], TypeRef::Boolean)
                    .modifiers(public())
                    .body(|inv| Ok(inv.get("walks")?)),
            ),
        TypeDeclaration::class(GOAT)
            .extends(ANIMAL)
            .modifiers(public())
            .implements(LOCOMOTION)
            .constructor(
                ConstructorDecl::new([TypeRef::String])
                    .modifiers(public())
                    .body(|inv| {
                        inv.super_construct(&[TypeRef::String], &[inv.arg(0)?.clone()])?;
                        Ok(Value::Void)
                    }),
            )
            .method(
                MethodDecl::new("getSound", [], TypeRef::String)
                    .modifiers(Modifiers::PROTECTED)
                    .body(|_| Ok("bleat".into())),
            )
            .method(
                MethodDecl::new("eats", [], TypeRef::String)
                    .modifiers(public())
                    .body(|_| Ok("grass".into())),
            )
            .method(
                MethodDecl::new("getLocomotion", [], TypeRef::String)
                    .modifiers(public())
                    .body(|_| Ok("walking".into())),
            )
            .method(
                MethodDecl::new("kick", [], TypeRef::Void)
                    .modifiers(public())
                    .body(|_| Err(Tantrum("stubborn").into())),
            ),
        TypeDeclaration::class(PERSON)
            .modifiers(public())
            .field(FieldDecl::new("name", TypeRef::String).modifiers(Modifiers::PRIVATE))
            .field(FieldDecl::new("age", TypeRef::Int).modifiers(Modifiers::PRIVATE))
            .constructor(ConstructorDecl::new([]).modifiers(public())),
    ]
}

fn registry() -> Arc<TypeRegistry> {
    let registry = TypeRegistry::default();
    registry.declare_all(zoo()).unwrap();
    Arc::new(registry)
}

fn engine() -> InvocationEngine {
    InvocationEngine::new(registry())
}

fn names<'a>(items: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    items.into_iter().collect()
}

// ============================================================================
// Type identity and structure
// ============================================================================

mod structure {
    use super::*;

    #[test]
    fn test_names() {
        let registry = registry();
        let goat = registry.resolve(GOAT).unwrap();
        assert_eq!(goat.simple_name(), "Goat");
        assert_eq!(goat.name(), GOAT);
        assert_eq!(goat.canonical_name(), GOAT);
        assert_eq!(goat.package_name(), "com.lou.reflect.test");
    }

    #[test]
    fn test_modifiers() {
        let registry = registry();
        let animal = registry.resolve(ANIMAL).unwrap();
        let goat = registry.resolve(GOAT).unwrap();
        assert!(goat.modifiers().is_public());
        assert!(animal.modifiers().is_abstract());
        assert!(animal.modifiers().is_public());
    }

    #[test]
    fn test_supertypes() {
        let registry = registry();
        let goat = registry.resolve(GOAT).unwrap();
        assert_eq!(goat.supertype().unwrap().name(), ANIMAL);

        let string = registry.resolve(STRING_TYPE).unwrap();
        assert_eq!(string.supertype().unwrap().name(), "lang.Object");
        assert!(registry.resolve("lang.Object").unwrap().supertype().is_none());
    }

    #[test]
    fn test_interfaces_are_direct_only() {
        let registry = registry();
        let goat = registry.resolve(GOAT).unwrap();
        let animal = registry.resolve(ANIMAL).unwrap();

        assert_eq!(goat.declared_interfaces().len(), 1);
        assert_eq!(animal.declared_interfaces().len(), 1);
        assert_eq!(goat.declared_interfaces()[0].simple_name(), "Locomotion");
        assert_eq!(animal.declared_interfaces()[0].simple_name(), "Eating");

        // the recursive walk is a separate query
        assert_eq!(all_interfaces(&goat).len(), 2);
    }

    #[test]
    fn test_declared_members() {
        let registry = registry();
        let goat = registry.resolve(GOAT).unwrap();
        let animal = registry.resolve(ANIMAL).unwrap();

        assert_eq!(public_constructors(&goat).len(), 1);
        assert_eq!(animal.declared_fields().len(), 2);
        assert_eq!(animal.declared_methods().len(), 3);
        let methods = names(animal.declared_methods().iter().map(|m| m.name()));
        for expected in ["getName", "setName", "getSound"] {
            assert!(methods.contains(&expected));
        }
    }

    #[test]
    fn test_declared_fields_exclude_inherited() {
        let registry = registry();
        let bird = registry.resolve(BIRD).unwrap();
        let own = names(bird.declared_fields().iter().map(|f| f.name()));
        assert_eq!(own, vec!["walks"]);

        let mut all: Vec<String> = hierarchy(&bird)
            .iter()
            .flat_map(|ty| {
                ty.declared_fields()
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect::<Vec<_>>()
            })
            .collect();
        all.sort();
        assert_eq!(all, vec!["CATEGORY", "name", "walks"]);
    }

    #[test]
    fn test_person_fields() {
        let registry = registry();
        let person = registry.resolve(PERSON).unwrap();
        let fields = names(person.declared_fields().iter().map(|f| f.name()));
        for field in &fields {
            assert!(["age", "name"].contains(field));
        }
        assert_eq!(fields.len(), 2);
    }
}

// ============================================================================
// Construction
// ============================================================================

mod construction {
    use super::*;

    #[test]
    fn test_three_bird_constructors() {
        let engine = engine();
        let bird = engine.registry().resolve(BIRD).unwrap();
        let ctor1 = bird.find_constructor(&[]).unwrap();
        let ctor2 = bird.find_constructor(&[TypeRef::String]).unwrap();
        let ctor3 = bird.find_constructor(&[TypeRef::String, TypeRef::Boolean]).unwrap();
        assert_ne!(ctor1.id(), ctor2.id());
        assert_ne!(ctor2.id(), ctor3.id());

        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let get_name = animal.find_method("getName", &[]).unwrap();
        let is_walks = bird.find_method("isWalks", &[]).unwrap();

        let bird1 = engine.construct(ctor1, &[], None).unwrap();
        assert_eq!(
            engine.invoke(get_name, Some(&bird1), &[], None).unwrap(),
            Value::from("bird-default")
        );

        let bird2 = engine.construct(ctor2, &[Value::from("bird2")], None).unwrap();
        assert_eq!(engine.invoke(get_name, Some(&bird2), &[], None).unwrap(), Value::from("bird2"));
        assert_eq!(engine.invoke(is_walks, Some(&bird2), &[], None).unwrap(), Value::Bool(false));

        let bird3 = engine
            .construct(ctor3, &[Value::from("bird3"), Value::Bool(true)], None)
            .unwrap();
        assert_eq!(engine.invoke(get_name, Some(&bird3), &[], None).unwrap(), Value::from("bird3"));
        assert_eq!(engine.invoke(is_walks, Some(&bird3), &[], None).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_abstract_type_cannot_be_constructed() {
        let engine = engine();
        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let ctor = animal.find_constructor(&[TypeRef::String]).unwrap();
        let err = engine.construct(ctor, &[Value::from("x")], None).unwrap_err();
        assert!(matches!(err, ReflectError::InstantiationFailure { cause: None, .. }));
    }

    #[test]
    fn test_signature_mismatches() {
        let engine = engine();
        let goat = engine.registry().resolve(GOAT).unwrap();

        let err = goat.find_constructor(&[TypeRef::Int]).unwrap_err();
        assert!(matches!(err, ReflectError::MemberNotFound { .. }));

        let ctor = goat.find_constructor(&[TypeRef::String]).unwrap();
        let err = engine.construct(ctor, &[Value::Int(1)], None).unwrap_err();
        assert!(matches!(err, ReflectError::ArgumentTypeMismatch { .. }));
    }

    #[test]
    fn test_failing_constructor_body() {
        let registry = TypeRegistry::default();
        registry
            .declare(
                TypeDeclaration::class("zoo.Fragile")
                    .modifiers(public())
                    .constructor(
                        ConstructorDecl::new([])
                            .modifiers(public())
                            .body(|_| Err(Tantrum("cracked").into())),
                    ),
            )
            .unwrap();
        let engine = InvocationEngine::new(Arc::new(registry));
        let err = engine.new_instance("zoo.Fragile").unwrap_err();
        assert!(matches!(err, ReflectError::InstantiationFailure { .. }));
        let cause = err.target_cause().unwrap();
        assert!(cause.downcast_ref::<Tantrum>().is_some());
    }

    #[test]
    fn test_new_instance_requires_public_no_arg_constructor() {
        let engine = engine();
        let person = engine.new_instance(PERSON).unwrap();
        assert_eq!(person.type_name(), PERSON);

        let err = engine.new_instance(GOAT).unwrap_err();
        assert!(matches!(err, ReflectError::MemberNotFound { .. }));
        let err = engine.new_instance("zoo.Missing").unwrap_err();
        assert!(matches!(err, ReflectError::TypeNotFound(_)));
    }
}

// ============================================================================
// Field access
// ============================================================================

mod fields {
    use super::*;

    #[test]
    fn test_private_field_needs_override() {
        let engine = engine();
        let bird = engine.new_instance(BIRD).unwrap();
        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let name = animal.find_declared_field("name").unwrap();

        let err = engine.get_field(name, Some(&bird), None).unwrap_err();
        assert!(matches!(err, ReflectError::AccessDenied { .. }));
        let err = engine.set_field(name, Some(&bird), Value::from("x"), None).unwrap_err();
        assert!(matches!(err, ReflectError::AccessDenied { .. }));

        let token = override_access(name);
        engine
            .set_field(name, Some(&bird), Value::from("a bird"), Some(&token))
            .unwrap();
        assert_eq!(
            engine.get_field(name, Some(&bird), Some(&token)).unwrap(),
            Value::from("a bird")
        );

        let get_name = animal.find_method("getName", &[]).unwrap();
        assert_eq!(engine.invoke(get_name, Some(&bird), &[], None).unwrap(), Value::from("a bird"));

        let set_name = animal.find_method("setName", &[TypeRef::String]).unwrap();
        engine
            .invoke(set_name, Some(&bird), &[Value::from("another")], None)
            .unwrap();
        assert_eq!(
            engine.invoke(get_name, Some(&bird), &[], None).unwrap(),
            Value::from("another")
        );
    }

    #[test]
    fn test_token_is_bound_to_one_field() {
        let engine = engine();
        let bird = engine.new_instance(BIRD).unwrap();
        let bird_ty = engine.registry().resolve(BIRD).unwrap();
        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let name = animal.find_declared_field("name").unwrap();
        let walks = bird_ty.find_declared_field("walks").unwrap();

        let token = override_access(name);
        let err = engine.get_field(walks, Some(&bird), Some(&token)).unwrap_err();
        assert!(matches!(err, ReflectError::AccessDenied { .. }));
    }

    #[test]
    fn test_static_field_ignores_receiver() {
        let engine = engine();
        let goat = engine
            .construct(
                engine
                    .registry()
                    .resolve(GOAT)
                    .unwrap()
                    .find_constructor(&[TypeRef::String])
                    .unwrap(),
                &[Value::from("billy")],
                None,
            )
            .unwrap();
        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let category = animal.find_declared_field("CATEGORY").unwrap();

        assert_eq!(engine.get_field(category, None, None).unwrap(), Value::from("domestic"));
        assert_eq!(engine.get_field(category, Some(&goat), None).unwrap(), Value::from("domestic"));

        engine.set_field(category, None, Value::from("wild"), None).unwrap();
        assert_eq!(engine.get_field(category, Some(&goat), None).unwrap(), Value::from("wild"));
    }

    #[test]
    fn test_field_value_type_checked() {
        let engine = engine();
        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let category = animal.find_declared_field("CATEGORY").unwrap();
        let err = engine.set_field(category, None, Value::Int(3), None).unwrap_err();
        assert!(matches!(err, ReflectError::ArgumentTypeMismatch { .. }));
        engine.set_field(category, None, Value::Null, None).unwrap();
    }

    #[test]
    fn test_wrong_receiver() {
        let engine = engine();
        let person = engine.new_instance(PERSON).unwrap();
        let bird_ty = engine.registry().resolve(BIRD).unwrap();
        let walks = bird_ty.find_declared_field("walks").unwrap();
        let token = override_access(walks);
        let err = engine.get_field(walks, Some(&person), Some(&token)).unwrap_err();
        assert!(matches!(err, ReflectError::ArgumentTypeMismatch { .. }));
    }
}

// ============================================================================
// Invocation
// ============================================================================

mod invocation {
    use super::*;

    fn goat(engine: &InvocationEngine) -> refract_engine::ObjectRef {
        let ty = engine.registry().resolve(GOAT).unwrap();
        let ctor = ty.find_constructor(&[TypeRef::String]).unwrap();
        engine.construct(ctor, &[Value::from("billy")], None).unwrap()
    }

    #[test]
    fn test_body_failure_is_preserved() {
        let engine = engine();
        let goat = goat(&engine);
        let kick = goat.type_descriptor().find_method("kick", &[]).unwrap();

        let err = engine.invoke(kick, Some(&goat), &[], None).unwrap_err();
        match &err {
            ReflectError::InvocationTarget { member, .. } => {
                assert_eq!(member, "com.lou.reflect.test.Goat.kick()");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let source = std::error::Error::source(&err).unwrap();
        let tantrum = source.downcast_ref::<Tantrum>().unwrap();
        assert_eq!(tantrum.0, "stubborn");
    }

    #[test]
    fn test_virtual_dispatch_through_abstract_method() {
        let engine = engine();
        let goat = goat(&engine);
        let bird = engine.new_instance(BIRD).unwrap();
        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let get_sound = animal.find_method("getSound", &[]).unwrap();

        let err = engine.invoke(get_sound, Some(&goat), &[], None).unwrap_err();
        assert!(matches!(err, ReflectError::AccessDenied { .. }));

        let token = override_access(get_sound);
        assert_eq!(
            engine.invoke(get_sound, Some(&goat), &[], Some(&token)).unwrap(),
            Value::from("bleat")
        );
        assert_eq!(engine.invoke(get_sound, Some(&bird), &[], Some(&token)).unwrap(), Value::Null);
    }

    #[test]
    fn test_interface_method_dispatch() {
        let engine = engine();
        let goat = goat(&engine);
        let eating = engine.registry().resolve(EATING).unwrap();
        let locomotion = engine.registry().resolve(LOCOMOTION).unwrap();
        let eats = eating.find_method("eats", &[]).unwrap();
        let get_locomotion = locomotion.find_method("getLocomotion", &[]).unwrap();

        assert_eq!(engine.invoke(eats, Some(&goat), &[], None).unwrap(), Value::from("grass"));
        assert_eq!(
            engine.invoke(get_locomotion, Some(&goat), &[], None).unwrap(),
            Value::from("walking")
        );

        // Bird does not implement Locomotion
        let bird = engine.new_instance(BIRD).unwrap();
        let err = engine.invoke(get_locomotion, Some(&bird), &[], None).unwrap_err();
        assert!(matches!(err, ReflectError::ArgumentTypeMismatch { .. }));
    }

    #[test]
    fn test_missing_implementation() {
        let registry = TypeRegistry::default();
        registry.declare_all(zoo()).unwrap();
        registry
            .declare(
                TypeDeclaration::class("zoo.Ghost")
                    .extends(ANIMAL)
                    .modifiers(public())
                    .constructor(ConstructorDecl::new([]).modifiers(public()).body(|inv| {
                        inv.super_construct(&[TypeRef::String], &[Value::from("boo")])?;
                        Ok(Value::Void)
                    })),
            )
            .unwrap();
        let engine = InvocationEngine::new(Arc::new(registry));
        let ghost = engine.new_instance("zoo.Ghost").unwrap();
        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let get_sound = animal.find_method("getSound", &[]).unwrap();
        let token = override_access(get_sound);

        let err = engine.invoke(get_sound, Some(&ghost), &[], Some(&token)).unwrap_err();
        assert!(matches!(err, ReflectError::AbstractMethod { .. }));
    }

    #[test]
    fn test_argument_count_checked() {
        let engine = engine();
        let goat = goat(&engine);
        let animal = engine.registry().resolve(ANIMAL).unwrap();
        let set_name = animal.find_method("setName", &[TypeRef::String]).unwrap();
        let err = engine.invoke(set_name, Some(&goat), &[], None).unwrap_err();
        assert!(matches!(err, ReflectError::ArgumentTypeMismatch { .. }));
    }

    #[test]
    fn test_unknown_type_argument() {
        let engine = engine();
        let goat = goat(&engine);
        assert!(engine.conforms(&TypeRef::named(ANIMAL), &Value::Object(goat.clone())));
        assert!(engine.conforms(&TypeRef::named(EATING), &Value::Object(goat.clone())));
        assert!(!engine.conforms(&TypeRef::named(BIRD), &Value::Object(goat)));
    }
}

// ============================================================================
// Registry behaviour
// ============================================================================

mod registry_cache {
    use super::*;

    #[test]
    fn test_concurrent_resolution_shares_descriptor() {
        let registry = registry();
        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    registry.resolve(GOAT).unwrap()
                })
            })
            .collect();

        let resolved: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for ty in &resolved[1..] {
            assert!(Arc::ptr_eq(&resolved[0], ty));
        }
        assert!(Arc::ptr_eq(&resolved[0], &registry.resolve(GOAT).unwrap()));
        assert!(Arc::ptr_eq(
            resolved[0].supertype().unwrap(),
            &registry.resolve(ANIMAL).unwrap()
        ));
    }

    #[test]
    fn test_cyclic_declarations_fail() {
        let registry = TypeRegistry::default();
        registry
            .declare_all([
                TypeDeclaration::class("zoo.Chicken").extends("zoo.Egg"),
                TypeDeclaration::class("zoo.Egg").extends("zoo.Chicken"),
            ])
            .unwrap();
        let err = registry.resolve("zoo.Chicken").unwrap_err();
        assert!(matches!(err, ReflectError::CyclicInheritance(_)));
    }
}

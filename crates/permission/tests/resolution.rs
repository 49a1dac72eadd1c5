//! Permission and option resolution through `PermissionService`.

use permission_core::{
    Context, ContextSet, PermissionService, ServiceConfig, SubjectData, SubjectReference, Tristate,
};

fn reference(text: &str) -> SubjectReference {
    text.parse().expect("valid subject reference")
}

fn nether() -> ContextSet {
    ContextSet::from(Context::world("nether"))
}

#[tokio::test]
async fn own_permissions_win_over_parents() {
    let service = PermissionService::default();
    let alice = service.load_subject(&reference("user:alice")).unwrap();
    let admin = service.load_subject(&reference("group:admin")).unwrap();
    let global = ContextSet::global();

    admin
        .subject_data()
        .set_permission(&global, "world.edit", Tristate::True)
        .await;
    alice
        .subject_data()
        .add_parent(&global, admin.reference().clone())
        .await;

    assert!(service.has_permission(alice.reference(), &global, "world.edit.fill"));

    alice
        .subject_data()
        .set_permission(&global, "world.edit.fill", Tristate::False)
        .await;
    assert!(!service.has_permission(alice.reference(), &global, "world.edit.fill"));
    assert!(service.has_permission(alice.reference(), &global, "world.edit.copy"));
}

#[tokio::test]
async fn context_specific_data_is_more_specific() {
    let service = PermissionService::default();
    let alice = service.load_subject(&reference("user:alice")).unwrap();
    let data = alice.subject_data();

    data.set_permission(&ContextSet::global(), "fly", Tristate::False).await;
    data.set_permission(&nether(), "fly", Tristate::True).await;

    let active = nether().with(Context::new("server", "survival"));
    assert_eq!(
        service.permission_value(alice.reference(), &active, "fly"),
        Tristate::True
    );
    assert_eq!(
        service.permission_value(alice.reference(), &ContextSet::from(Context::world("end")), "fly"),
        Tristate::False
    );
}

#[tokio::test]
async fn transient_data_takes_precedence() {
    let service = PermissionService::default();
    let alice = service.load_subject(&reference("user:alice")).unwrap();
    let global = ContextSet::global();

    alice.subject_data().set_permission(&global, "chat", Tristate::True).await;
    alice.transient_data().set_permission(&global, "chat", Tristate::False).await;

    assert_eq!(
        service.permission_value(alice.reference(), &global, "chat"),
        Tristate::False
    );
}

#[tokio::test]
async fn parent_cycles_terminate() {
    let service = PermissionService::default();
    let a = service.load_subject(&reference("group:a")).unwrap();
    let b = service.load_subject(&reference("group:b")).unwrap();
    let global = ContextSet::global();

    a.subject_data().add_parent(&global, b.reference().clone()).await;
    b.subject_data().add_parent(&global, a.reference().clone()).await;

    assert_eq!(
        service.permission_value(a.reference(), &global, "anything"),
        Tristate::Undefined
    );
}

#[tokio::test]
async fn depth_limit_stops_long_parent_chains() {
    let service = PermissionService::new(ServiceConfig::new().with_max_parent_depth(2));
    let global = ContextSet::global();

    for depth in 0..4 {
        let subject = service
            .load_subject(&reference(&format!("group:g{depth}")))
            .unwrap();
        subject
            .subject_data()
            .add_parent(&global, reference(&format!("group:g{}", depth + 1)))
            .await;
    }
    let top = service.load_subject(&reference("group:g4")).unwrap();
    top.subject_data().set_permission(&global, "deep", Tristate::True).await;

    assert_eq!(
        service.permission_value(&reference("group:g2"), &global, "deep"),
        Tristate::True
    );
    assert_eq!(
        service.permission_value(&reference("group:g0"), &global, "deep"),
        Tristate::Undefined
    );
}

#[tokio::test]
async fn defaults_fill_in_undefined_values() {
    let service = PermissionService::default();
    let global = ContextSet::global();
    service
        .collection_defaults("user")
        .unwrap()
        .subject_data()
        .set_permission(&global, "spawn", Tristate::True)
        .await;
    service
        .defaults()
        .unwrap()
        .subject_data()
        .set_permission(&global, "help", Tristate::True)
        .await;

    let bob = reference("user:bob");
    service.load_subject(&bob).unwrap();
    assert!(service.has_permission(&bob, &global, "spawn"));
    assert!(service.has_permission(&bob, &global, "help"));
    assert!(!service.has_permission(&reference("group:staff"), &global, "spawn"));
    assert!(service.has_permission(&reference("group:staff"), &global, "help"));

    let strict = PermissionService::new(ServiceConfig::new().with_defaults(false));
    strict
        .defaults()
        .unwrap()
        .subject_data()
        .set_permission(&global, "help", Tristate::True)
        .await;
    assert!(!strict.has_permission(&bob, &global, "help"));
}

#[tokio::test]
async fn configured_default_applies_last() {
    let service =
        PermissionService::new(ServiceConfig::new().with_default_permission(Tristate::True));
    assert!(service.has_permission(&reference("user:nobody"), &ContextSet::global(), "x"));
}

#[tokio::test]
async fn options_resolve_through_parents() {
    let service = PermissionService::default();
    let alice = service.load_subject(&reference("user:alice")).unwrap();
    let admin = service.load_subject(&reference("group:admin")).unwrap();
    let global = ContextSet::global();

    admin
        .subject_data()
        .set_option(&global, "prefix", Some("[Admin]".into()))
        .await;
    alice
        .subject_data()
        .add_parent(&nether(), admin.reference().clone())
        .await;

    assert_eq!(
        service.option(alice.reference(), &nether(), "PREFIX").as_deref(),
        Some("[Admin]")
    );
    assert_eq!(service.option(alice.reference(), &global, "prefix"), None);
    assert_eq!(
        service.parents_of(alice.reference(), &nether()),
        vec![admin.reference().clone()]
    );
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn snapshot_survives_json() {
    use permission_core::{MemorySubjectData, SubjectDataSnapshot};

    let data = MemorySubjectData::new();
    data.set_permission(&nether(), "fly", Tristate::True).await;
    data.add_parent(&ContextSet::global(), reference("group:admin")).await;

    let json = serde_json::to_string(&data.snapshot()).unwrap();
    let snapshot: SubjectDataSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(MemorySubjectData::from_snapshot(snapshot).snapshot(), data.snapshot());
}

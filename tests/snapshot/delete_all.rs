//! Delete-all planning and ordering.

use clap::Parser;
use pulsar_admin::memory::InMemoryDirectory;
use pulsar_admin::TopicSource;
use pulsar_snapshot::commands::delete::{delete_all, plan_deletion};
use pulsar_snapshot::SystemResourceOpts;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    system: SystemResourceOpts,
}

fn system_defaults() -> SystemResourceOpts {
    TestCli::parse_from(["test"]).system
}

fn cluster() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_cluster("standalone")
        .with_tenant("public")
        .with_tenant("pulsar")
        .with_tenant("acme")
        .with_namespace("public/default")
        .with_namespace("pulsar/system")
        .with_namespace("acme/orders")
        .with_namespace("acme/audit")
        .with_listing(
            "public/default",
            TopicSource::Persistent,
            &["persistent://public/default/keep"],
        )
        .with_listing(
            "acme/orders",
            TopicSource::Persistent,
            &[
                "persistent://acme/orders/created",
                "persistent://acme/orders/events-partition-0",
                "persistent://acme/orders/events-partition-1",
            ],
        )
        .with_listing(
            "acme/orders",
            TopicSource::Partitioned,
            &["persistent://acme/orders/events"],
        )
        .with_listing(
            "acme/audit",
            TopicSource::Persistent,
            &["persistent://acme/audit/log"],
        )
}

#[tokio::test]
async fn test_plan_excludes_system_resources() {
    let plan = plan_deletion(&cluster(), &system_defaults()).await;
    assert_eq!(plan.tenants, vec!["acme"]);
    assert_eq!(plan.namespaces, vec!["acme/orders", "acme/audit"]);
    assert_eq!(
        plan.topics.canonical(),
        vec![
            "persistent://acme/orders/events",
            "persistent://acme/orders/created",
            "persistent://acme/audit/log",
        ]
    );
}

#[tokio::test]
async fn test_delete_in_dependency_order() {
    let directory = cluster();
    let plan = plan_deletion(&directory, &system_defaults()).await;
    let report = delete_all(&directory, &plan).await;

    assert_eq!(report.topics.deleted, 3);
    assert_eq!(report.namespaces.deleted, 2);
    assert_eq!(report.tenants.deleted, 1);

    assert_eq!(
        directory.deleted_topics(),
        vec![
            ("persistent://acme/orders/events".to_string(), true),
            ("persistent://acme/orders/created".to_string(), false),
            ("persistent://acme/audit/log".to_string(), false),
        ]
    );
    assert_eq!(directory.deleted_namespaces(), vec!["acme/orders", "acme/audit"]);
    assert_eq!(directory.deleted_tenants(), vec!["acme"]);
    assert_eq!(directory.tenants(), vec!["public", "pulsar"]);
    assert_eq!(directory.namespaces(), vec!["public/default", "pulsar/system"]);
}

#[tokio::test]
async fn test_failures_are_counted_and_skipped() {
    let directory = cluster()
        .fail_name("persistent://acme/audit/log")
        .fail_name("acme/audit");
    let plan = plan_deletion(&directory, &system_defaults()).await;
    let report = delete_all(&directory, &plan).await;

    assert_eq!(report.topics.deleted, 2);
    assert_eq!(report.topics.failed, 1);
    assert_eq!(report.namespaces.deleted, 1);
    assert_eq!(report.namespaces.failed, 1);
    assert_eq!(report.tenants.deleted, 1);
    assert_eq!(report.topics.to_string(), "2 deleted, 1 failed");
}

#[tokio::test]
async fn test_nothing_to_delete() {
    let directory = InMemoryDirectory::new()
        .with_tenant("public")
        .with_namespace("public/default");
    let plan = plan_deletion(&directory, &system_defaults()).await;
    assert!(plan.tenants.is_empty());
    assert!(plan.topics.is_empty());

    let report = delete_all(&directory, &plan).await;
    assert_eq!(report, Default::default());
    assert!(directory.deleted_tenants().is_empty());
}

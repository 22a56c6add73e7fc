//! Typed clients over a real redb store.
//!
//! Rows are written the way a cache agent writes them and read back through
//! the typed clients, including across a store reopen.

use std::sync::Arc;

use serde_json::json;

use stratus_cache::*;

const ARN: &str = "arn:aws:ecs:us-west-2:123456789012:container-instance/abc";

fn row(key: String, attributes: serde_json::Value) -> CacheData {
    CacheData::new(key, serde_json::from_value(attributes).unwrap())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

fn seeded_store() -> CacheStore {
    init_tracing();
    let store = CacheStore::open_in_memory().unwrap();
    store
        .put_all(
            Namespace::ContainerInstances,
            &[
                row(
                    keys::container_instance("ecs-prod", "us-west-2", ARN),
                    json!({
                        "containerInstanceArn": ARN,
                        "ec2InstanceId": "i-1",
                        "availabilityZone": "us-west-2a",
                    }),
                ),
                row(
                    keys::container_instance("ecs-prod", "us-east-1", "arn:ci/east"),
                    json!({ "containerInstanceArn": "arn:ci/east", "ec2InstanceId": "i-2" }),
                ),
                row(
                    keys::container_instance("ecs-dev", "us-west-2", "arn:ci/dev"),
                    json!({ "ec2InstanceId": "i-3" }),
                ),
            ],
        )
        .unwrap();
    store
        .put(
            Namespace::Services,
            &row(
                keys::service("ecs-prod", "us-west-2", "web"),
                json!({
                    "clusterName": "main",
                    "serviceName": "web",
                    "serviceArn": "arn:aws:ecs:us-west-2:123456789012:service/web",
                    "desiredCount": 2,
                }),
            ),
        )
        .unwrap();
    store
}

#[test]
fn container_instance_row_projects_exactly() {
    let client = ContainerInstanceCacheClient::new(Arc::new(seeded_store()));

    let instance = client
        .get(&keys::container_instance("ecs-prod", "us-west-2", ARN))
        .unwrap()
        .unwrap();

    assert_eq!(instance.arn, ARN);
    assert_eq!(instance.ec2_instance_id, "i-1");
    assert_eq!(instance.availability_zone, "us-west-2a");
}

#[test]
fn get_all_drops_unconvertible_rows() {
    let client = ContainerInstanceCacheClient::new(Arc::new(seeded_store()));

    let mut arns: Vec<String> = client.get_all().unwrap().into_iter().map(|ci| ci.arn).collect();
    arns.sort();

    assert_eq!(arns, vec![ARN.to_string(), "arn:ci/east".to_string()]);
}

#[test]
fn get_all_in_scopes_by_account_and_region() {
    let client = ContainerInstanceCacheClient::new(Arc::new(seeded_store()));

    let west = client.get_all_in("ecs-prod", "us-west-2").unwrap();
    assert_eq!(west.len(), 1);
    assert_eq!(west[0].arn, ARN);

    assert!(client.get_all_in("ecs-prod", "eu-west-1").unwrap().is_empty());
    assert!(client.get_all_in("ecs-dev", "us-west-2").unwrap().is_empty());
}

#[test]
fn get_all_in_reads_names_with_glob_and_separator_characters_literally() {
    let store = seeded_store();
    let task_row = |account: &str, region: &str, id: &str| {
        row(
            keys::task(account, region, id),
            json!({ "taskArn": format!("arn:task/{id}"), "clusterArn": "arn:cluster/main" }),
        )
    };
    store
        .put_all(
            Namespace::Tasks,
            &[
                task_row("prod*", "us-west-2", "t-1"),
                task_row("prod-a", "us-west-2", "t-2"),
                task_row("team:prod", "us-west-2", "t-3"),
                task_row("team", "prod:us-west-2", "t-4"),
            ],
        )
        .unwrap();
    let client = TaskCacheClient::new(Arc::new(store));

    let starred = client.get_all_in("prod*", "us-west-2").unwrap();
    assert_eq!(starred.len(), 1);
    assert_eq!(starred[0].task_id, "t-1");
    assert_eq!(starred[0].account, "prod*");

    let team = client.get_all_in("team:prod", "us-west-2").unwrap();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0].task_id, "t-3");
    assert_eq!(team[0].account, "team:prod");
    assert_eq!(team[0].region, "us-west-2");
}

#[test]
fn clients_share_one_store() {
    let cache: Arc<dyn Cache> = Arc::new(seeded_store());
    let instances = ContainerInstanceCacheClient::new(Arc::clone(&cache));
    let services = ServiceCacheClient::new(Arc::clone(&cache));

    assert_eq!(
        instances.filter_identifiers("container-service:containerInstances:ecs-prod:*").unwrap().len(),
        2
    );
    let web = services.get_all().unwrap();
    assert_eq!(web.len(), 1);
    assert_eq!(web[0].account, "ecs-prod");
    assert_eq!(web[0].desired_count, 2);
    assert!(services.filter_identifiers("*:containerInstances:*").unwrap().is_empty());
}

#[test]
fn rows_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache.redb");
    let key = keys::task("ecs-prod", "us-west-2", "t-1");

    init_tracing();
    {
        let store = CacheStore::open(&path).unwrap();
        store
            .put(
                Namespace::Tasks,
                &row(
                    key.clone(),
                    json!({
                        "taskArn": "arn:aws:ecs:us-west-2:1:task/t-1",
                        "clusterArn": "arn:aws:ecs:us-west-2:1:cluster/main",
                        "lastStatus": "RUNNING",
                    }),
                ),
            )
            .unwrap();
    }

    let client = TaskCacheClient::new(Arc::new(CacheStore::open(&path).unwrap()));
    let task = client.get(&key).unwrap().unwrap();
    assert_eq!(task.task_id, "t-1");
    assert_eq!(task.last_status, "RUNNING");
}

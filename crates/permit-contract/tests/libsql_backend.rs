//! The contract over the libSQL ledger, opened directly and from config.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use permit_config::{EventsConfig, LedgerBackend, LedgerConfig, PermitConfig};
use permit_contract::{ErrorKind, PermitContract};
use permit_core::enums::PermitStatus;
use permit_core::identity::ClientId;
use permit_store::LibsqlLedger;

fn alice() -> ClientId {
    ClientId::new("alice@OrgA")
}

#[tokio::test]
async fn lifecycle_persists_across_reopen() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("permits.db");
    let path = path.to_str().unwrap();

    {
        let contract = PermitContract::new(LibsqlLedger::open_local(path).await.unwrap());
        contract.create_permit(&alice(), "P-1", "OrgA").await.unwrap();
        contract
            .append_evidence(&alice(), "P-1", "survey.pdf", "sha256:5e")
            .await
            .unwrap();
        contract.update_status(&alice(), "P-1", "UNDER_REVIEW").await.unwrap();
    }

    let contract = PermitContract::new(LibsqlLedger::open_local(path).await.unwrap());
    let record = contract.get_by_id("P-1").await.unwrap();
    assert_eq!(record.status, PermitStatus::UnderReview);
    assert_eq!(record.evidence.len(), 1);

    let history = contract.get_history_entries("P-1").await.unwrap();
    let statuses: Vec<_> = history.iter().map(|h| h.record.status).collect();
    assert_eq!(
        statuses,
        vec![PermitStatus::Submitted, PermitStatus::Submitted, PermitStatus::UnderReview]
    );
    assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert_eq!(history[2].tx_id, record.last_tx_id);

    let err = contract
        .create_permit(&alice(), "P-1", "OrgA")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
}

#[tokio::test]
async fn queries_select_permits_by_field() {
    let contract = PermitContract::new(LibsqlLedger::open_local(":memory:").await.unwrap());
    contract.create_permit(&alice(), "P-1", "OrgA").await.unwrap();
    contract.create_permit(&alice(), "P-2", "OrgA").await.unwrap();
    contract
        .create_permit(&ClientId::new("bob@OrgB"), "P-3", "OrgB")
        .await
        .unwrap();
    contract.update_status(&alice(), "P-1", "REJECTED").await.unwrap();

    let rejected = contract.list_by_status("REJECTED").await.unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].id, "P-1");

    assert_eq!(contract.list_by_organization("OrgB").await.unwrap().len(), 1);
    assert_eq!(contract.list_all().await.unwrap().len(), 3);
    assert_eq!(
        contract.list_by_status("BOGUS").await.unwrap_err().kind(),
        ErrorKind::Validation
    );
}

#[tokio::test]
async fn from_config_wires_ledger_and_events() {
    let tmp = TempDir::new().unwrap();
    let config = PermitConfig {
        ledger: LedgerConfig {
            backend: LedgerBackend::Libsql,
            path: tmp.path().join("db").join("ledger.db").to_string_lossy().into_owned(),
        },
        events: EventsConfig {
            enabled: true,
            dir: tmp.path().join("events").to_string_lossy().into_owned(),
        },
    };

    let contract = PermitContract::from_config(&config).await.unwrap();
    assert_eq!(contract.ledger().backend(), LedgerBackend::Libsql);
    assert!(contract.events().is_enabled());

    contract.create_permit(&alice(), "P-1", "OrgA").await.unwrap();
    let events = contract.events().read_all().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].permit_id, "P-1");
}

#[tokio::test]
async fn from_config_rejects_libsql_without_path() {
    let config = PermitConfig {
        ledger: LedgerConfig {
            backend: LedgerBackend::Libsql,
            path: String::new(),
        },
        ..PermitConfig::default()
    };
    let err = PermitContract::from_config(&config).await.err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Storage);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn contracts_sharing_a_ledger_file_surface_races_as_concurrent_modification() {
    use std::sync::Arc;

    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("shared.db");
    let path = path.to_str().unwrap();

    let first = Arc::new(PermitContract::new(LibsqlLedger::open_local(path).await.unwrap()));
    let second = Arc::new(PermitContract::new(LibsqlLedger::open_local(path).await.unwrap()));
    first.create_permit(&alice(), "P-1", "OrgA").await.unwrap();

    let mut tasks = Vec::new();
    for worker in 0..4 {
        let contract = if worker % 2 == 0 {
            Arc::clone(&first)
        } else {
            Arc::clone(&second)
        };
        tasks.push(tokio::spawn(async move {
            let mut appended = 0_usize;
            for n in 0..25 {
                let filename = format!("w{worker}-{n}.pdf");
                match contract
                    .append_evidence(&alice(), "P-1", &filename, "sha256:aa")
                    .await
                {
                    Ok(_) => appended += 1,
                    Err(err) => assert_eq!(err.kind(), ErrorKind::ConcurrentModification, "{err}"),
                }
            }
            appended
        }));
    }

    let mut appended = 0;
    for task in tasks {
        appended += task.await.unwrap();
    }

    let record = second.get_by_id("P-1").await.unwrap();
    assert_eq!(record.evidence.len(), appended);
    assert_eq!(first.get_history_entries("P-1").await.unwrap().len(), appended + 1);
}

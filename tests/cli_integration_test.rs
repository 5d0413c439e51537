//! CLI integration tests: parse real argument vectors and run them against an
//! in-memory session.
//!
//! Tests cover:
//! - Config loading and validation from INI files on disk
//! - Contract, market and alert commands mutating the store
//! - Report commands over populated data
//! - CSV import and export through the command layer

mod common;

use clap::Parser;
use common::*;
use grainledger::adapters::file_config_adapter::FileConfigAdapter;
use grainledger::adapters::memory_adapter::MemoryAdapter;
use grainledger::cli::{self, Cli, Session};
use grainledger::domain::contract::ContractFilter;
use grainledger::domain::crop::{ContractStatus, Crop};
use grainledger::domain::error::GrainError;
use grainledger::ports::contract_port::ContractPort;
use grainledger::ports::snapshot_port::SnapshotPort;

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["grainledger", "--memory"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

fn farm_config() -> FileConfigAdapter {
    FileConfigAdapter::from_string(FARM_INI).unwrap()
}

fn run(session: &Session<'_>, args: &[&str]) -> Result<(), GrainError> {
    cli::execute(session, parse(args).command)
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_reads_file() {
        let file = write_temp_file(FARM_INI);
        let config = cli::load_config(Some(file.path())).unwrap();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        assert_eq!(session.settings.rank_size, 2);
        assert_eq!(session.settings.default_crop_year, 2026);
    }

    #[test]
    fn load_config_missing_file_fails() {
        let path = std::path::Path::new("/nonexistent/grainledger.ini");
        assert!(cli::load_config(Some(path)).is_err());
    }

    #[test]
    fn absent_config_uses_defaults() {
        let config = cli::load_config(None).unwrap();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        assert_eq!(session.settings.rank_size, 3);
    }

    #[test]
    fn invalid_bands_stop_the_session() {
        let config =
            FileConfigAdapter::from_string("[marketing]\nahead_pct = 20\non_track_pct = 50\n").unwrap();
        let store = MemoryAdapter::new();
        let clock = clock();
        let err = Session::new(&store, &config, &clock).err().unwrap();
        assert!(matches!(err, GrainError::ConfigInvalid { .. }));
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn malformed_production_estimate_stops_the_session() {
        let ini = FARM_INI.replace("corn = 50000", "corn = 120k");
        assert_ne!(ini, FARM_INI);
        let file = write_temp_file(&ini);
        let config = cli::load_config(Some(file.path())).unwrap();
        let store = MemoryAdapter::new();
        let clock = clock();
        let err = Session::new(&store, &config, &clock).err().unwrap();
        assert!(matches!(
            err,
            GrainError::ConfigInvalid { ref section, .. } if section == "production"
        ));
        assert_eq!(err.exit_status(), 2);
    }

    #[test]
    fn validate_command_checks_sections() {
        let config = FileConfigAdapter::from_string("[elevator.adm]\ncorn_basis = lots\n").unwrap();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        assert!(run(&session, &["validate"]).is_err());
    }
}

mod contracts {
    use super::*;

    #[test]
    fn add_update_deliver_delete() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();

        run(
            &session,
            &[
                "contract", "add", "--crop", "corn", "--type", "basis", "--bushels", "5000",
                "--futures-price", "4.62", "--basis", "-35", "--futures-month", "Dec26",
                "--elevator", "ADM", "--notes", "spring sale",
            ],
        )
        .unwrap();

        let stored = store.list_contracts().unwrap();
        assert_eq!(stored.len(), 1);
        let id = stored[0].id.clone();

        run(
            &session,
            &["contract", "update", &id, "--bushels", "6000", "--clear", "notes"],
        )
        .unwrap();
        let updated = store.get_contract(&id).unwrap().unwrap();
        assert_eq!(updated.bushels, 6000.0);
        assert_eq!(updated.notes, None);

        run(&session, &["contract", "deliver", &id]).unwrap();
        run(&session, &["contract", "deliver", &id]).unwrap();
        assert_eq!(
            store.get_contract(&id).unwrap().unwrap().status,
            ContractStatus::Delivered
        );

        run(&session, &["contract", "delete", &id]).unwrap();
        assert!(store.list_contracts().unwrap().is_empty());
        let err = run(&session, &["contract", "delete", &id]).unwrap_err();
        assert_eq!(err.exit_status(), 5);
    }

    #[test]
    fn add_without_elevator_is_a_validation_error() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();

        let err = run(
            &session,
            &["contract", "add", "--crop", "soybeans", "--type", "cash", "--bushels", "100", "--futures-price", "10"],
        )
        .unwrap_err();
        assert!(matches!(err, GrainError::Validation { .. }));
        assert!(store.list_contracts().unwrap().is_empty());
    }

    #[test]
    fn empty_update_is_rejected() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        let c = session.ledger.create(draft(Crop::Corn, 1000.0, 4.5)).unwrap();
        assert!(run(&session, &["contract", "update", &c.id]).is_err());
    }

    #[test]
    fn list_show_audit_and_export() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        let mut conflicted = draft_with(Crop::Corn, 1000.0, 4.5, None, "Dec27");
        conflicted.crop_year = Some(2026);
        let c = session.ledger.create(conflicted).unwrap();

        run(&session, &["contract", "list", "--crop", "corn", "--status", "open"]).unwrap();
        run(&session, &["contract", "show", &c.id]).unwrap();
        run(&session, &["contract", "audit"]).unwrap();
        assert_eq!(session.ledger.crop_year_conflicts().unwrap().len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("contracts.csv");
        run(&session, &["contract", "export", out.to_str().unwrap()]).unwrap();
        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains(&c.id));
    }
}

mod market {
    use super::*;

    #[test]
    fn record_derives_basis() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();

        run(
            &session,
            &[
                "market", "record", "--crop", "corn", "--futures-month", "Dec26",
                "--futures-price", "4.62", "--cash-price", "4.27",
            ],
        )
        .unwrap();
        let snaps = store.snapshots_for(Crop::Corn).unwrap();
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].basis, -35.0);

        run(&session, &["market", "latest"]).unwrap();
        run(&session, &["market", "history", "--crop", "corn", "--days", "7", "--daily"]).unwrap();
    }

    #[test]
    fn history_rejects_bad_window() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        for days in ["0", "-3", "week"] {
            let err = run(&session, &["market", "history", "--crop", "corn", "--days", days])
                .unwrap_err();
            assert!(matches!(err, GrainError::Validation { .. }), "{days}");
        }
    }

    #[test]
    fn import_records_every_row() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        let file = write_temp_file(
            "crop,futures_month,futures_price,cash_price,basis\ncorn,Dec26,4.6,4.25,\nsoybeans,Nov26,10.4,9.95,-45\n",
        );

        run(&session, &["market", "import", file.path().to_str().unwrap()]).unwrap();
        assert_eq!(store.snapshots_for(Crop::Corn).unwrap().len(), 1);
        assert_eq!(store.snapshots_for(Crop::Soybeans).unwrap().len(), 1);
    }

    #[test]
    fn import_with_bad_row_records_nothing() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        let file = write_temp_file(
            "crop,futures_month,futures_price,cash_price\ncorn,Dec26,4.6,4.25\noats,Dec26,3.6,3.2\n",
        );

        let err = run(&session, &["market", "import", file.path().to_str().unwrap()]).unwrap_err();
        assert_eq!(err.exit_status(), 4);
        assert!(store.snapshots_for(Crop::Corn).unwrap().is_empty());
    }
}

mod alerts {
    use super::*;

    #[test]
    fn add_check_dismiss() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();

        run(
            &session,
            &["alert", "add", "--crop", "corn", "--type", "basis_below", "--target", "-30"],
        )
        .unwrap();
        let id = session.alerts.list().unwrap()[0].id.clone();

        run(&session, &["alert", "check"]).unwrap();
        run(
            &session,
            &["alert", "update", &id, "--target", "-32.5", "--futures-month", "Mar27"],
        )
        .unwrap();
        let updated = session.alerts.get(&id).unwrap();
        assert_eq!(updated.target_value, -32.5);
        assert_eq!(updated.futures_month.as_deref(), Some("Mar27"));

        run(&session, &["alert", "dismiss", &id]).unwrap();
        assert!(session.alerts.list_active().unwrap().is_empty());
        run(&session, &["alert", "list", "--active"]).unwrap();

        run(&session, &["alert", "delete", &id]).unwrap();
        assert!(session.alerts.list().unwrap().is_empty());
    }
}

mod reports {
    use super::*;

    #[test]
    fn every_report_runs_on_populated_data() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();

        let mut d = draft_with(Crop::Corn, 20_000.0, 4.62, Some(-35.0), "Dec26");
        d.delivery.end = Some(date(2026, 6, 30));
        session.ledger.create(d).unwrap();
        session
            .ledger
            .create(draft_with(Crop::Soybeans, 4_000.0, 10.85, None, "Nov26"))
            .unwrap();
        session.market.record(entry(Crop::Corn, 4.60, 4.25)).unwrap();

        let cases: [&[&str]; 10] = [
            &["report", "exposure"],
            &["report", "exposure", "--crop", "corn", "--crop-year", "2026"],
            &["report", "positions"],
            &["report", "types"],
            &["report", "rank", "--top", "1"],
            &["report", "deliveries"],
            &["report", "deliveries", "--year", "2026", "--month", "6"],
            &["report", "plan", "--crop", "corn"],
            &["report", "elevators", "--crop", "corn"],
            &["report", "elevators", "--crop", "soybeans"],
        ];
        for args in cases {
            run(&session, args).unwrap_or_else(|e| panic!("{args:?}: {e}"));
        }
        assert_eq!(session.ledger.deliveries_in(2026, 6).unwrap().len(), 1);
    }

    #[test]
    fn deliveries_rejects_bad_month() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        let err = run(&session, &["report", "deliveries", "--month", "13"]).unwrap_err();
        assert!(matches!(err, GrainError::Validation { .. }));
    }

    #[test]
    fn reports_never_mutate_the_ledger() {
        let config = farm_config();
        let store = MemoryAdapter::new();
        let clock = clock();
        let session = Session::new(&store, &config, &clock).unwrap();
        session.ledger.create(draft(Crop::Corn, 1000.0, 4.5)).unwrap();
        let before = session.ledger.list(&ContractFilter::default()).unwrap();

        run(&session, &["report", "exposure"]).unwrap();
        run(&session, &["report", "rank"]).unwrap();
        assert_eq!(session.ledger.list(&ContractFilter::default()).unwrap(), before);
    }
}

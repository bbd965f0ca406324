use clap::{Args, Subcommand};
use engine_config::settings::{
    DEFAULT_CHECKPOINT_COUNT, DEFAULT_CHECKPOINT_SIZE, DEFAULT_DELETE_PARTITION_VALUE,
    DEFAULT_MAX_CONNECTION_POOL_SIZE, DEFAULT_PARTITION_KEY_PATH, Operation, RunSettings, error::SettingsError,
    validated::RunSettingsBuilder,
};
use engine_core::workload::{DEFAULT_FILLER_FIELDS, WorkloadSettings};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Insert synthetic documents, one checkpoint at a time
    Import {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(long, help = "Overwrite documents whose id already exists")]
        upsert: bool,
    },
    /// Update the documents a previous import wrote (set f0, remove f1)
    Update {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Delete documents in a single bulk call
    Delete {
        #[command(flatten)]
        common: CommonArgs,

        #[arg(
            long,
            default_value = DEFAULT_DELETE_PARTITION_VALUE,
            help = "Only delete documents with this partition-key value"
        )]
        partition_value: String,

        #[arg(
            long,
            conflicts_with = "partition_value",
            help = "Delete every document in the collection"
        )]
        all_partitions: bool,
    },
}

impl Commands {
    pub fn into_parts(self) -> (Operation, CommonArgs) {
        match self {
            Commands::Import { common, upsert } => (
                Operation::Import {
                    allow_upsert: upsert,
                },
                common,
            ),
            Commands::Update { common } => (Operation::Update, common),
            Commands::Delete {
                common,
                partition_value,
                all_partitions,
            } => {
                let partition_value = (!all_partitions).then_some(partition_value);
                (Operation::Delete { partition_value }, common)
            }
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Store endpoint: memory://[name] or sled://<dir>")]
    pub endpoint: String,

    #[arg(long, help = "Store credential; defaults to $BULK_MASTER_KEY")]
    pub master_key: Option<String>,

    #[arg(long, help = "KEY=VALUE file read before resolving the credential")]
    pub env_file: Option<PathBuf>,

    #[arg(long)]
    pub database_id: String,

    #[arg(long)]
    pub collection_id: String,

    #[arg(long, help = "Create the database and collection when missing")]
    pub create_collection: bool,

    #[arg(long, help = "Throughput (RU/s) to set on the collection")]
    pub throughput: Option<u32>,

    #[arg(long, default_value = DEFAULT_PARTITION_KEY_PATH)]
    pub partition_key: String,

    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_SIZE, help = "Documents per checkpoint")]
    pub checkpoint_size: usize,

    #[arg(long, default_value_t = DEFAULT_CHECKPOINT_COUNT, help = "Number of checkpoints")]
    pub checkpoint_count: u64,

    #[arg(
        long,
        default_value_t = DEFAULT_MAX_CONNECTION_POOL_SIZE,
        help = "Physical partitions written to concurrently"
    )]
    pub max_connection_pool_size: usize,

    #[arg(long, default_value_t = DEFAULT_FILLER_FIELDS, help = "Filler fields per document")]
    pub filler_fields: usize,

    #[arg(long, help = "Append a random token to generated ids")]
    pub random_id_suffix: bool,

    #[arg(long, help = "Write the run summary as JSON to this file")]
    pub report: Option<PathBuf>,
}

impl CommonArgs {
    pub fn settings(
        &self,
        operation: Operation,
        credential: Option<String>,
    ) -> Result<RunSettings, SettingsError> {
        let mut builder = RunSettingsBuilder::new(operation)
            .endpoint(&self.endpoint)
            .database(&self.database_id)
            .collection(&self.collection_id)
            .create_collection(self.create_collection)
            .throughput(self.throughput)
            .partition_key_path(&self.partition_key)
            .checkpoint_size(self.checkpoint_size)
            .checkpoint_count(self.checkpoint_count)
            .max_connection_pool_size(self.max_connection_pool_size)
            .workload(WorkloadSettings {
                filler_fields: self.filler_fields,
                random_id_suffix: self.random_id_suffix,
            });
        if let Some(credential) = credential {
            builder = builder.credential(credential);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        command: Commands,
    }

    const REQUIRED: [&str; 6] = [
        "--endpoint",
        "memory://",
        "--database-id",
        "db",
        "--collection-id",
        "coll",
    ];

    fn parse(args: &[&str]) -> Result<(Operation, CommonArgs), clap::Error> {
        let argv = std::iter::once("bulkctl").chain(args.iter().copied());
        TestCli::try_parse_from(argv).map(|cli| cli.command.into_parts())
    }

    fn with_required<'a>(subcommand: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec![subcommand];
        args.extend(REQUIRED);
        args.extend_from_slice(extra);
        args
    }

    #[test]
    fn delete_defaults_to_partition_two() {
        let (operation, _) = parse(&with_required("delete", &[])).unwrap();
        assert_eq!(
            operation,
            Operation::Delete {
                partition_value: Some("2".into())
            }
        );

        let (operation, _) = parse(&with_required("delete", &["--all-partitions"])).unwrap();
        assert_eq!(
            operation,
            Operation::Delete {
                partition_value: None
            }
        );
    }

    #[test]
    fn import_takes_upsert_and_defaults() {
        let (operation, args) = parse(&with_required("import", &["--upsert"])).unwrap();
        assert_eq!(operation, Operation::Import { allow_upsert: true });
        assert_eq!(args.checkpoint_size, 500_000);
        assert_eq!(args.checkpoint_count, 10);
        assert_eq!(args.partition_key, "/partitionKey");
        assert!(!args.create_collection);
        assert_eq!(args.max_connection_pool_size, 1000);
    }

    #[test]
    fn missing_required_flag_is_rejected() {
        assert!(parse(&["update", "--endpoint", "memory://"]).is_err());
        assert!(parse(&with_required("update", &["--checkpoint-size", "lots"])).is_err());
    }

    #[test]
    fn builds_validated_settings() {
        let (operation, args) = parse(&with_required(
            "update",
            &[
                "--checkpoint-size",
                "100",
                "--throughput",
                "4000",
                "--max-connection-pool-size",
                "8",
            ],
        ))
        .unwrap();

        let settings = args.settings(operation.clone(), Some("key".into())).unwrap();
        assert_eq!(settings.checkpoint_size, 100);
        assert_eq!(settings.throughput, Some(4000));
        assert_eq!(settings.max_connection_pool_size, 8);

        let err = args.settings(operation, None).unwrap_err();
        assert_eq!(err, SettingsError::Missing("credential"));
    }
}

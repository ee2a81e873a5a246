//! CLI entry point for hostscope-admission
//!
//! Generates record identifiers and runs admission checks from the command line, using the
//! same naming strategy as the control plane it operates on.
//!
//! # Examples
//!
//! Record identifier of a backend resource:
//! ```bash
//! HOSTSCOPE_NAMING_STRATEGY=prefix-host ./hostscope-admission name web --owner libvirt-host1
//! ```
//!
//! Admission of a domain against an inventory of stored records:
//! ```bash
//! ./hostscope-admission --naming-strategy hash admit domain \
//!     --name web --owner libvirt-host2 --boot-disk host1-seed --records inventory.txt
//! ```

use clap::{Parser, Subcommand};
use hostscope_admission::{Candidate, load_inventory};
use hostscope_core::admission::{
    api::{AdmissionRequest, AdmissionResponse, admission::AdmissionApiService},
    infrastructure::{
        naming::{NameGenerator, NamingStrategy},
        resource::ResourceKind,
    },
    services::lookup::RecordIndex,
};
use tower::ServiceExt;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(name = "hostscope-admission")]
#[command(about = "Host-scoped record naming and admission checks", long_about = None)]
struct Args {
    /// Naming strategy: none, prefix-provider, prefix-host or hash (unrecognized values mean none)
    #[arg(long, global = true, env = "HOSTSCOPE_NAMING_STRATEGY")]
    naming_strategy: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the record identifier of a backend resource
    Name {
        /// Name of the resource on its backend host
        backend_name: String,

        /// Owning-host identifier
        #[arg(long)]
        owner: String,
    },
    /// Run a create admission for a resource and print the admitted record
    Admit {
        /// Resource kind: domain, volume, pool or boot-disk
        #[arg(value_parser = parse_kind)]
        kind: ResourceKind,

        /// Name of the resource on its backend host
        #[arg(long)]
        name: String,

        /// Owning-host identifier
        #[arg(long)]
        owner: Option<String>,

        /// Record identifier generated earlier, checked instead of derived
        #[arg(long)]
        record_id: Option<String>,

        /// Record identifier of the boot disk (domains)
        #[arg(long)]
        boot_disk: Option<String>,

        /// Volume path of a disk device, repeatable (domains)
        #[arg(long = "disk")]
        disks: Vec<String>,

        /// Backend name of the pool (volumes)
        #[arg(long)]
        pool: Option<String>,

        /// Path of the base volume (volumes)
        #[arg(long)]
        base_volume: Option<String>,

        /// Inventory of stored records to validate against
        #[arg(short, long)]
        records: Option<String>,
    },
}

fn parse_kind(s: &str) -> Result<ResourceKind, String> {
    ResourceKind::try_from(s)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_writer(std::io::stderr).with_target(false).with_env_filter(filter).init();

    let args = Args::parse();

    // Parsed once, then passed to every generation call
    let strategy = NamingStrategy::from(args.naming_strategy.as_deref());
    debug!("Naming strategy: {}", strategy);

    match args.command {
        Command::Name { backend_name, owner } => {
            println!("{}", NameGenerator::new(strategy).generate(&backend_name, &owner));
            Ok(())
        }
        Command::Admit {
            kind,
            name,
            owner,
            record_id,
            boot_disk,
            disks,
            pool,
            base_volume,
            records,
        } => {
            let resource = Candidate { name, owner, record_id, boot_disk, disks, pool, base_volume }
                .into_resource(kind)?;
            let index = match records {
                Some(path) => {
                    let index = load_inventory(&path)?;
                    info!("Loaded {} record(s) from {}", index.len(), path);
                    index
                }
                None => RecordIndex::new(),
            };
            let admission = AdmissionApiService::new(strategy, index);
            run_admission(admission, AdmissionRequest::Create(resource)).await
        }
    }
}

/// Submit one request and print the admitted record, or fail with the rejection
async fn run_admission(
    admission: AdmissionApiService<RecordIndex>,
    request: AdmissionRequest,
) -> anyhow::Result<()> {
    match admission.oneshot(request).await {
        Ok(AdmissionResponse::Admitted(record)) => {
            println!("{}", record.record_id);
            for (key, value) in record.labels.iter().chain(record.annotations.iter()) {
                println!("  {key}={value}");
            }
            Ok(())
        }
        Ok(AdmissionResponse::Ack) => Ok(()),
        Err(e) if e.is_rejection() => {
            info!("✗ Rejected: {}", e);
            Err(anyhow::anyhow!("{}", e))
        }
        Err(e) => Err(e.into()),
    }
}

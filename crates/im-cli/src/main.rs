use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use im_client::{AuthData, ClientConfig, CloudResource, ImClient, ImResponse, TemplateType};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "im")]
#[command(about = "Infrastructure Manager REST client", long_about = None)]
struct Cli {
    /// IM service URL
    #[arg(short, long, env = "IM_URL", global = true)]
    url: Option<String>,

    /// Auth file (searched in ./auth.dat, ./.im/auth.dat and the config dir if unset)
    #[arg(short, long, env = "IM_AUTH_FILE", global = true)]
    auth_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the client and IM service versions
    Version,
    /// List the infrastructures
    List,
    /// Create an infrastructure from a template file
    Create {
        file: PathBuf,
        /// Template format (radl, tosca, yaml, json)
        #[arg(short = 't', long = "type", default_value = "radl")]
        template_type: TemplateType,
    },
    /// Import an infrastructure exported from another IM service
    Import { file: PathBuf },
    /// List the VMs of an infrastructure
    Info { inf_id: String },
    /// Show the infrastructure and VM states
    State { inf_id: String },
    /// Destroy an infrastructure
    Destroy {
        inf_id: String,
        /// Return before the resources are released
        #[arg(long = "async")]
        async_delete: bool,
        /// Remove the infrastructure even if some resources fail to delete
        #[arg(long)]
        force: bool,
    },
    /// Add resources to an infrastructure
    AddResource {
        inf_id: String,
        file: PathBuf,
        #[arg(short = 't', long = "type", default_value = "radl")]
        template_type: TemplateType,
        /// Skip contextualization of the new VMs
        #[arg(long)]
        no_context: bool,
    },
    /// Reconfigure an infrastructure
    Reconfigure {
        inf_id: String,
        file: PathBuf,
        /// Template format (radl, json)
        #[arg(short = 't', long = "type", default_value = "radl")]
        template_type: TemplateType,
        /// VMs to reconfigure (all if omitted)
        #[arg(long = "vm", value_delimiter = ',')]
        vms: Vec<String>,
    },
    /// Export the infrastructure data
    Export {
        inf_id: String,
        /// Remove the infrastructure from this IM service
        #[arg(long)]
        delete: bool,
    },
    /// Show the outputs of a TOSCA infrastructure
    Outputs { inf_id: String },
    /// Show the contextualization log
    Contmsg {
        inf_id: String,
        #[arg(long = "vm")]
        vm_id: Option<String>,
    },
    /// Start an infrastructure or one of its VMs
    Start {
        inf_id: String,
        #[arg(long = "vm")]
        vm_id: Option<String>,
    },
    /// Stop an infrastructure or one of its VMs
    Stop {
        inf_id: String,
        #[arg(long = "vm")]
        vm_id: Option<String>,
    },
    /// Reboot a VM
    Reboot { inf_id: String, vm_id: String },
    /// Show the RADL of a VM
    VmInfo { inf_id: String, vm_id: String },
    /// Destroy a VM
    VmDestroy {
        inf_id: String,
        vm_id: String,
        /// Skip contextualization after the deletion
        #[arg(long)]
        no_context: bool,
    },
    /// Modify the features of a VM
    Alter {
        inf_id: String,
        vm_id: String,
        file: PathBuf,
        #[arg(short = 't', long = "type", default_value = "radl")]
        template_type: TemplateType,
    },
    /// Create a disk snapshot of a VM
    Snapshot {
        inf_id: String,
        vm_id: String,
        disk: u32,
        image_name: String,
        /// Delete the image when the VM is destroyed
        #[arg(long)]
        auto_delete: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let im = connect(&cli.command, cli.url, cli.auth_file)?;

    match cli.command {
        Commands::Version => {
            println!("im {}", env!("CARGO_PKG_VERSION"));
            let version = im.get_version().await?;
            println!("IM service {}", version.trim().cyan());
        }
        Commands::List => {
            let infs = check(im.get_infrastructure_list().await?, "listing infrastructures")?;
            println!("{}", format!("Infrastructures ({}):", infs.len()).bold());
            for inf in &infs {
                println!("  • {}", inf.id().cyan());
            }
        }
        Commands::Create {
            file,
            template_type,
        } => {
            let template = read_file(&file)?;
            println!("{}", "Creating infrastructure...".green());
            let inf = check(
                im.create_infrastructure(template, template_type).await?,
                "creating infrastructure",
            )?;
            println!("✓ Infrastructure {} created", inf.id().cyan());
        }
        Commands::Import { file } => {
            let data = read_file(&file)?;
            let inf = check(
                im.import_infrastructure(data).await?,
                "importing infrastructure",
            )?;
            println!("✓ Infrastructure {} imported", inf.id().cyan());
        }
        Commands::Info { inf_id } => {
            let mut inf = im.infrastructure(inf_id);
            let vms = check(inf.get_info().await?, "getting infrastructure info")?;
            println!("{}", format!("VMs of {} ({}):", inf.id(), vms.len()).bold());
            for vm in &vms {
                println!("  • {}", vm.id().cyan());
            }
        }
        Commands::State { inf_id } => {
            let mut inf = im.infrastructure(inf_id);
            let state = check(inf.get_state().await?, "getting infrastructure state")?;
            println!("{}: {}", inf.id(), state_colored(&state.state));
            let mut vm_states: Vec<_> = state.vm_states.iter().collect();
            vm_states.sort();
            for (vm_id, vm_state) in vm_states {
                println!("  • {}: {}", vm_id.cyan(), state_colored(vm_state));
            }
        }
        Commands::Destroy {
            inf_id,
            async_delete,
            force,
        } => {
            let inf = im.infrastructure(inf_id);
            println!("{}", format!("Destroying {}...", inf.id()).yellow());
            check(
                inf.destroy(async_delete, force).await?,
                "destroying infrastructure",
            )?;
            println!("✓ Infrastructure {} destroyed", inf.id().cyan());
        }
        Commands::AddResource {
            inf_id,
            file,
            template_type,
            no_context,
        } => {
            let template = read_file(&file)?;
            let mut inf = im.infrastructure(inf_id);
            let added = check(
                inf.add_resource(template, template_type, !no_context)
                    .await?,
                "adding resources",
            )?;
            println!("✓ {} VMs added", added.len());
            for vm in &added {
                println!("  • {}", vm.id().cyan());
            }
        }
        Commands::Reconfigure {
            inf_id,
            file,
            template_type,
            vms,
        } => {
            let template = read_file(&file)?;
            let vm_list: Vec<&str> = vms.iter().map(String::as_str).collect();
            let inf = im.infrastructure(inf_id);
            check(
                inf.reconfigure(template, template_type, &vm_list).await?,
                "reconfiguring infrastructure",
            )?;
            println!("✓ Infrastructure {} reconfigured", inf.id().cyan());
        }
        Commands::Export { inf_id, delete } => {
            let inf = im.infrastructure(inf_id);
            let data = check(inf.export(delete).await?, "exporting infrastructure")?;
            print_value(&data)?;
        }
        Commands::Outputs { inf_id } => {
            let inf = im.infrastructure(inf_id);
            let outputs = check(inf.get_outputs().await?, "getting outputs")?;
            print_value(&outputs)?;
        }
        Commands::Contmsg { inf_id, vm_id } => {
            let response = match vm_id {
                Some(vm_id) => im.virtual_machine(inf_id, vm_id).get_cont_msg().await?,
                None => im.infrastructure(inf_id).get_cont_msg().await?,
            };
            let log = check(response, "getting contextualization log")?;
            print_value(&log)?;
        }
        Commands::Start { inf_id, vm_id } => {
            let response = match vm_id {
                Some(vm_id) => im.virtual_machine(inf_id, vm_id).start().await?,
                None => im.infrastructure(inf_id).start().await?,
            };
            check(response, "starting")?;
            println!("{}", "✓ Started".green());
        }
        Commands::Stop { inf_id, vm_id } => {
            let response = match vm_id {
                Some(vm_id) => im.virtual_machine(inf_id, vm_id).stop().await?,
                None => im.infrastructure(inf_id).stop().await?,
            };
            check(response, "stopping")?;
            println!("{}", "✓ Stopped".green());
        }
        Commands::Reboot { inf_id, vm_id } => {
            let vm = im.virtual_machine(inf_id, vm_id);
            check(vm.reboot().await?, "rebooting VM")?;
            println!("✓ VM {} rebooted", vm.id().cyan());
        }
        Commands::VmInfo { inf_id, vm_id } => {
            let mut vm = im.virtual_machine(inf_id, vm_id);
            let radl = check(vm.get_info().await?, "getting VM info")?;
            println!("{}", radl);
        }
        Commands::VmDestroy {
            inf_id,
            vm_id,
            no_context,
        } => {
            let vm = im.virtual_machine(inf_id, vm_id);
            check(vm.destroy(!no_context).await?, "destroying VM")?;
            println!("✓ VM {} destroyed", vm.id().cyan());
        }
        Commands::Alter {
            inf_id,
            vm_id,
            file,
            template_type,
        } => {
            let template = read_file(&file)?;
            let mut vm = im.virtual_machine(inf_id, vm_id);
            let radl = check(vm.alter(template, template_type).await?, "altering VM")?;
            println!("✓ VM {} altered", vm.id().cyan());
            println!("{}", radl);
        }
        Commands::Snapshot {
            inf_id,
            vm_id,
            disk,
            image_name,
            auto_delete,
        } => {
            let vm = im.virtual_machine(inf_id, vm_id);
            let image = check(
                vm.create_disk_snapshot(disk, &image_name, auto_delete)
                    .await?,
                "creating disk snapshot",
            )?;
            println!("✓ Snapshot created: {}", image.cyan());
        }
    }

    Ok(())
}

fn connect(
    command: &Commands,
    url: Option<String>,
    auth_file: Option<PathBuf>,
) -> anyhow::Result<ImClient> {
    let url = url.ok_or_else(|| anyhow::anyhow!("IM service URL is required: --url or IM_URL"))?;
    tracing::debug!("Using IM service at {}", url);

    // The version endpoint is unauthenticated, so no auth file is needed
    if matches!(command, Commands::Version) {
        return Ok(ImClient::new(url, AuthData::new(Vec::new())?));
    }

    let mut config = ClientConfig::new(url);
    if let Some(path) = auth_file {
        config = config.with_auth_file(path);
    }
    Ok(config.connect()?)
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Unwrap a successful response or turn the service message into an error.
fn check<T>(response: ImResponse<T>, action: &str) -> anyhow::Result<T> {
    match response {
        ImResponse::Success(data) => Ok(data),
        ImResponse::Failure(message) => {
            eprintln!("{} {}", "✗ Error".red().bold(), action);
            Err(anyhow::anyhow!(message))
        }
    }
}

fn print_value(value: &serde_json::Value) -> anyhow::Result<()> {
    match value {
        serde_json::Value::String(text) => println!("{}", text),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}

fn state_colored(state: &str) -> colored::ColoredString {
    match state {
        "running" | "configured" => state.green(),
        "pending" | "unconfigured" | "stopped" | "off" => state.yellow(),
        "failed" | "unknown" => state.red(),
        _ => state.normal(),
    }
}

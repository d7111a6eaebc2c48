use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};

use storebase_core::{CompanyContext, CompanyId, CounterpartyId, OrderId, StoreId, UserId};
use storebase_gateway::{GatewayConfig, HttpGateway};
use storebase_shipment::{OneTimeField, ShipmentWorkflow, sheet};

#[derive(Parser)]
#[command(name = "shipment", version, about = "Create inbound shipments from orders, suppliers, or import sheets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a sample import sheet
    Sample {
        /// Destination CSV file
        path: PathBuf,
    },
    /// Import a sheet into a new shipment and save it
    Import(ImportArgs),
}

#[derive(Args)]
struct ImportArgs {
    /// CSV with columns SKU, Variant Name, Cost, Quantity
    file: PathBuf,

    #[arg(long, env = "STOREBASE_COMPANY_ID")]
    company: CompanyId,

    #[arg(long, env = "STOREBASE_STORE_ID")]
    store: StoreId,

    #[arg(long, env = "STOREBASE_USER_ID")]
    user: Option<UserId>,

    #[arg(long, env = "TZ", default_value = "UTC")]
    timezone: String,

    /// Ship against this purchase order
    #[arg(long, conflicts_with_all = ["supplier", "one_time_name"])]
    order: Option<OrderId>,

    /// Also add every remaining line of --order before importing
    #[arg(long, requires = "order")]
    with_order_lines: bool,

    /// Registered supplier
    #[arg(long, conflicts_with = "one_time_name")]
    supplier: Option<CounterpartyId>,

    /// One-time supplier name
    #[arg(long)]
    one_time_name: Option<String>,

    #[arg(long, requires = "one_time_name")]
    one_time_phone: Option<String>,

    #[arg(long, requires = "one_time_name")]
    one_time_email: Option<String>,

    #[arg(long, requires = "one_time_name")]
    one_time_address: Option<String>,

    #[arg(long)]
    tracking: Option<String>,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    title: Option<String>,

    /// Print the draft as JSON
    #[arg(long)]
    json: bool,

    /// Reconcile and print, but do not create the shipment
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    storebase_observability::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sample { path } => write_sample(path),
        Commands::Import(args) => import(args).await,
    }
}

fn write_sample(path: PathBuf) -> Result<()> {
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    sheet::write_sample(BufWriter::new(file))?;
    println!("Sample sheet written to {}", path.display());
    Ok(())
}

async fn import(args: ImportArgs) -> Result<()> {
    let file = File::open(&args.file).with_context(|| format!("opening {}", args.file.display()))?;
    let rows = sheet::parse_rows(file)?;

    let mut context = CompanyContext::new(args.company, Some(args.store), args.timezone.clone());
    if let Some(user) = args.user {
        context = context.with_user(user);
    }

    let gateway = HttpGateway::new(GatewayConfig::from_env())?;
    let mut workflow = ShipmentWorkflow::new(Arc::new(gateway), context);

    if let Err(err) = workflow.load_base_currency().await {
        tracing::warn!("Using default currency: {}", err);
    }

    if let Some(order_id) = args.order {
        workflow.list_orders().await?;
        workflow
            .select_order(order_id)
            .await
            .with_context(|| format!("selecting order {order_id}"))?;
        if args.with_order_lines {
            let added = workflow.add_all_from_order();
            tracing::info!("Added {} line(s) from order {}", added, order_id);
        }
    } else if let Some(supplier) = args.supplier {
        workflow.select_registered_supplier(Some(supplier));
    } else if let Some(name) = args.one_time_name {
        workflow.set_one_time_field(OneTimeField::Name, name);
        for (field, value) in [
            (OneTimeField::Phone, args.one_time_phone),
            (OneTimeField::Email, args.one_time_email),
            (OneTimeField::Address, args.one_time_address),
        ] {
            if let Some(value) = value {
                workflow.set_one_time_field(field, value);
            }
        }
    }

    let report = workflow.import_rows(&rows).await?;
    for miss in &report.misses {
        eprintln!("warning: {miss}");
    }

    workflow.set_tracking_number(args.tracking.unwrap_or_default());
    workflow.set_notes(args.notes.unwrap_or_default());
    workflow.set_title(args.title.unwrap_or_default());

    print_draft(&workflow, args.json)?;

    if args.dry_run {
        if let Err(rejection) = workflow.can_save() {
            eprintln!("warning: {rejection}");
        }
        return Ok(());
    }

    match workflow.save().await {
        Ok(shipment_number) => {
            println!("Shipment {shipment_number} created");
            Ok(())
        }
        Err(err) => bail!("{err}"),
    }
}

fn print_draft<G>(workflow: &ShipmentWorkflow<G>, json: bool) -> Result<()>
where
    G: storebase_gateway::RemoteProcedureGateway + ?Sized,
{
    let items: Vec<_> = workflow.draft().items().iter().collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    for item in &items {
        let flag = if item.exceeds_max() { " (over stock)" } else { "" };
        println!(
            "{:<20} {:<32} {:>6} x {:>12} = {:>14}{}",
            item.sku,
            item.display_name,
            item.quantity(),
            workflow.format_price(item.unit_cost()),
            workflow.format_price(item.line_total()),
            flag
        );
    }
    println!(
        "{} line(s), {} unit(s), total {}",
        items.len(),
        workflow.draft().items().total_quantity(),
        workflow.format_price(workflow.total_amount())
    );
    Ok(())
}

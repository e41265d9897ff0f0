mod console;
mod fields;

use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    config::{load_settings, Settings},
    wizard::SectionWizard,
    ActionOutcome, AutoConfirm, CollectionScreen, Confirmer, Direction, HttpCollectionApi,
    ItemFields, LocalMirrorStore, Payload, StaticToken, SubmitOutcome,
};
use shared::domain::{
    Contact, DocumentType, ItemId, ResourceKind, Section, SectionBody, SectionKind, StayType,
};
use tracing::info;

use crate::console::{ConsoleNotifier, StdinConfirmer};

#[derive(Parser, Debug)]
#[command(name = "dashboard-admin", about = "Edit ordered dashboard collections")]
struct Cli {
    /// TOML settings file (defaults to ./dashboard.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    api_url: Option<String>,
    #[arg(value_enum)]
    resource: Resource,
    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Resource {
    Contacts,
    StayTypes,
    DocumentTypes,
    Sections,
}

impl From<Resource> for ResourceKind {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Contacts => ResourceKind::Contacts,
            Resource::StayTypes => ResourceKind::StayTypes,
            Resource::DocumentTypes => ResourceKind::DocumentTypes,
            Resource::Sections => ResourceKind::Sections,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Move an item to a zero-based row index.
    Move {
        id: String,
        to: usize,
    },
    Up {
        id: String,
    },
    Down {
        id: String,
    },
    Toggle {
        id: String,
    },
    Delete {
        id: String,
        /// Answer yes to every confirmation, including the dependents one.
        #[arg(long)]
        yes: bool,
    },
    Create {
        /// key=value (string) or key:=json.
        #[arg(long = "field", short = 'f')]
        fields: Vec<String>,
        /// field=path of a file to upload.
        #[arg(long = "attach")]
        attachments: Vec<String>,
    },
    /// Build a section step by step and create it.
    CreateSection {
        #[arg(long, value_parser = parse_section_kind)]
        kind: SectionKind,
        #[arg(long)]
        title: String,
        #[arg(long)]
        subtitle: Option<String>,
        /// JSON object with the body for the chosen kind.
        #[arg(long)]
        data: String,
        #[arg(long)]
        hidden: bool,
    },
}

fn parse_section_kind(raw: &str) -> Result<SectionKind, String> {
    SectionKind::ALL
        .into_iter()
        .find(|kind| kind.label().eq_ignore_ascii_case(raw.trim()))
        .ok_or_else(|| {
            let labels: Vec<&str> = SectionKind::ALL.iter().map(|kind| kind.label()).collect();
            format!("unknown section kind '{raw}', expected one of {}", labels.join(", "))
        })
}

/// One-line summary shown by `list`.
trait Describe {
    fn describe(&self) -> String;
}

impl Describe for Contact {
    fn describe(&self) -> String {
        match &self.role {
            Some(role) => format!("{} ({role})", self.name),
            None => self.name.clone(),
        }
    }
}

impl Describe for StayType {
    fn describe(&self) -> String {
        self.name.clone()
    }
}

impl Describe for DocumentType {
    fn describe(&self) -> String {
        if self.required {
            format!("{} [required]", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl Describe for Section {
    fn describe(&self) -> String {
        format!("{} <{}>", self.title, self.body.kind().label())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref());
    if let Some(api_url) = cli.api_url.clone() {
        settings.api_url = api_url;
    }
    let kind = ResourceKind::from(cli.resource);
    info!(api_url = %settings.api_url, resource = kind.label(), "dashboard-admin starting");

    match kind {
        ResourceKind::Contacts => run::<Contact>(&settings, kind, cli.command).await,
        ResourceKind::StayTypes => run::<StayType>(&settings, kind, cli.command).await,
        ResourceKind::DocumentTypes => run::<DocumentType>(&settings, kind, cli.command).await,
        ResourceKind::Sections => run::<Section>(&settings, kind, cli.command).await,
    }
}

async fn run<P: Payload + Describe>(
    settings: &Settings,
    kind: ResourceKind,
    command: Command,
) -> Result<()> {
    let api = HttpCollectionApi::<P>::new(
        &settings.api_url,
        settings.endpoint_path(kind),
        settings.endpoint_options(),
        Arc::new(StaticToken(settings.token.clone())),
    )
    .context("invalid api url")?;
    let confirmer: Arc<dyn Confirmer> = match &command {
        Command::Delete { yes: true, .. } => Arc::new(AutoConfirm(true)),
        _ => Arc::new(StdinConfirmer),
    };
    let screen = CollectionScreen::new(
        Arc::new(api),
        Arc::new(ConsoleNotifier),
        confirmer,
        settings.rollback_policy(),
    );
    screen
        .mount()
        .await
        .with_context(|| format!("could not load {}", kind.label()))?;

    match command {
        Command::List { search } => {
            let mut mirror = screen.collection.mirror().await;
            if let Some(search) = search {
                mirror.set_search(search);
            }
            for item in mirror.visible() {
                let flag = if item.active { ' ' } else { '-' };
                println!(
                    "{:>4} {flag} {:<8} {}",
                    item.position,
                    item.id.to_string(),
                    item.payload.describe()
                );
            }
        }
        Command::Move { id, to } => {
            let from = locate(&*screen.collection.mirror().await, &id)?.index;
            report_submit(screen.reorder.move_to(from, to).await)?;
        }
        Command::Up { id } => {
            let index = locate(&*screen.collection.mirror().await, &id)?.index;
            report_submit(screen.reorder.arrow_move(index, Direction::Up).await)?;
        }
        Command::Down { id } => {
            let index = locate(&*screen.collection.mirror().await, &id)?.index;
            report_submit(screen.reorder.arrow_move(index, Direction::Down).await)?;
        }
        Command::Toggle { id } => {
            let found = locate(&*screen.collection.mirror().await, &id)?;
            screen
                .actions
                .toggle_active(&found.id, found.active)
                .await
                .with_context(|| format!("could not toggle item {id}"))?;
        }
        Command::Delete { id, .. } => {
            let found = locate(&*screen.collection.mirror().await, &id)?;
            let outcome = screen
                .actions
                .remove(&found.id, Some(found.label.as_str()))
                .await
                .with_context(|| format!("could not delete item {id}"))?;
            if outcome == ActionOutcome::Declined {
                println!("nothing deleted");
            }
        }
        Command::Create {
            fields,
            attachments,
        } => {
            let item = fields::build_fields(&fields, &attachments).await?;
            screen
                .actions
                .create(item)
                .await
                .context("could not create item")?;
        }
        Command::CreateSection {
            kind: section_kind,
            title,
            subtitle,
            data,
            hidden,
        } => {
            if kind != ResourceKind::Sections {
                bail!("create-section only applies to sections");
            }
            let item = build_section(section_kind, title, subtitle, &data, !hidden)?;
            screen
                .actions
                .create(item)
                .await
                .context("could not create section")?;
        }
    }

    screen.unmount();
    Ok(())
}

fn build_section(
    kind: SectionKind,
    title: String,
    subtitle: Option<String>,
    data: &str,
    active: bool,
) -> Result<ItemFields> {
    let data: serde_json::Value =
        serde_json::from_str(data).context("--data must be a JSON object")?;
    let body: SectionBody =
        serde_json::from_value(serde_json::json!({ "type": kind.label(), "data": data }))
            .with_context(|| format!("--data does not match a {} section", kind.label()))?;

    let mut wizard = SectionWizard::new();
    wizard.choose_kind(kind);
    wizard.advance()?;
    wizard.set_title(title);
    wizard.set_subtitle(subtitle);
    wizard.set_active(active);
    wizard.advance()?;
    wizard.set_body(body);
    wizard.advance()?;
    Ok(wizard.finish()?)
}

struct Located {
    index: usize,
    id: ItemId,
    active: bool,
    label: String,
}

/// Finds a row by the id typed on the command line.
fn locate<P: Payload + Describe>(mirror: &LocalMirrorStore<P>, raw: &str) -> Result<Located> {
    let item = mirror
        .find_by_text(raw)
        .ok_or_else(|| anyhow!("no item with id '{raw}'"))?;
    let index = mirror
        .index_of(&item.id)
        .ok_or_else(|| anyhow!("item '{raw}' vanished from the list"))?;
    Ok(Located {
        index,
        id: item.id.clone(),
        active: item.active,
        label: item.payload.describe(),
    })
}

fn report_submit(outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Saved { .. } => Ok(()),
        SubmitOutcome::NothingToSave(reason) => {
            println!("order unchanged ({reason:?})");
            Ok(())
        }
        SubmitOutcome::Superseded { seq } => bail!("reorder #{seq} was superseded"),
        SubmitOutcome::Failed { error, .. } => Err(error).context("could not save the order"),
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kestrel_credential::{BearerToken, Credential, GateAccount, Operation};
use kestrel_emitter::{Emitter, LogEmitter};
use kestrel_network::{ATTRIBUTE_FILE_NAME, MemoryNetwork};
use kestrel_notification::{DispatchConfig, Dispatcher, PersistingEmitter, archived_notifications};
use kestrel_object::{ObjectExecutor, ObjectParameters};
use kestrel_store::{FsStore, Store};
use kestrel_transfer::{DualStream, DuplexStream, IoSink, IoSource, MemorySink, ProgressStream};

/// Epochs a freshly minted bearer token stays valid.
const TOKEN_LIFETIME_EPOCHS: u64 = 100;

/// Kestrel - object storage transfers with asynchronous notifications
#[derive(Parser)]
#[command(name = "kestrel")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.kestrel)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Upload a file to an in-memory network, list, download and delete it
  Roundtrip {
    /// File to upload
    file: PathBuf,

    /// Where to write the downloaded copy
    #[arg(long)]
    out: Option<PathBuf>,
  },

  /// Print archived notifications
  Notifications,
}

fn main() -> Result<()> {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".kestrel"),
  };

  match cli.command {
    Some(Commands::Roundtrip { file, out }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(roundtrip(file, out, data_dir))?;
    }
    Some(Commands::Notifications) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(print_notifications(data_dir))?;
    }
    None => {
      println!("kestrel - use --help to see available commands");
    }
  }

  Ok(())
}

/// Report transfer progress through the log.
fn with_progress<S: DuplexStream>(stream: S, title: String, total: u64) -> ProgressStream<S> {
  let emitter: Arc<dyn Emitter> = Arc::new(LogEmitter);
  ProgressStream::new(stream, emitter, title, Some(total))
}

fn params(
  operation: Operation,
  container: &str,
  object: &str,
  credential: &Credential,
  account: &GateAccount,
  cancel: &CancellationToken,
) -> ObjectParameters {
  let emitter: Arc<dyn Emitter> = Arc::new(LogEmitter);
  ObjectParameters::new(operation, container, object, credential.clone(), emitter)
    .with_gate_account(account.clone())
    .with_cancel(cancel.clone())
}

async fn roundtrip(file: PathBuf, out: Option<PathBuf>, data_dir: PathBuf) -> Result<()> {
  let store: Arc<dyn Store> = Arc::new(FsStore::new(&data_dir));

  // Network with one container, owned by a separate issuing account.
  let network = MemoryNetwork::default();
  let owner = GateAccount::generate();
  let gate = GateAccount::generate();
  let container = network.create_container(&owner).await;
  let bearer = BearerToken::issue(
    owner.signing_key(),
    container,
    network.current_epoch() + TOKEN_LIFETIME_EPOCHS,
    vec![
      Operation::Put,
      Operation::Get,
      Operation::Head,
      Operation::Search,
      Operation::Delete,
    ],
  );
  let credential = Credential::Delegated(bearer);
  info!(container = %container, gate = %gate.owner(), "network prepared");

  let dispatcher = Arc::new(Dispatcher::new(
    Arc::new(PersistingEmitter::new(LogEmitter, Some(store))),
    DispatchConfig::for_recipient(gate.owner().to_string()),
  ));
  dispatcher.listen_and_emit()?;

  let executor = ObjectExecutor::new(Arc::new(network), dispatcher.clone());
  let cancel = CancellationToken::new();
  let container = container.to_string();

  let result = transfer(&executor, &file, out.as_deref(), &container, &credential, &gate, &cancel).await;

  dispatcher.end();
  dispatcher.wait().await.context("notification delivery failed")?;
  result
}

async fn transfer(
  executor: &ObjectExecutor,
  file: &Path,
  out: Option<&Path>,
  container: &str,
  credential: &Credential,
  gate: &GateAccount,
  cancel: &CancellationToken,
) -> Result<()> {
  // Upload
  let source = tokio::fs::File::open(file)
    .await
    .with_context(|| format!("failed to open {}", file.display()))?;
  let size = source
    .metadata()
    .await
    .with_context(|| format!("failed to stat {}", file.display()))?
    .len();
  let file_name = file
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  let upload = with_progress(
    DualStream::new(IoSource::new(source), MemorySink::new()),
    format!("Uploading {}", file_name),
    size,
  );
  let mut create = params(Operation::Put, container, "", credential, gate, cancel)
    .with_attribute(ATTRIBUTE_FILE_NAME, file_name)
    .with_stream(upload);
  let id = executor.create(&mut create).await.context("upload failed")?;
  eprintln!("Uploaded object: {}", id);

  // List
  let list = params(Operation::Search, container, "", credential, gate, cancel);
  let listed = executor.list(&list).await.context("listing failed")?;
  println!("{}", serde_json::to_string_pretty(&listed)?);

  // Download
  let object = id.to_string();
  let read = params(Operation::Get, container, &object, credential, gate, cancel);
  let (header, remote) = executor.init_reader(&read).await.context("download failed")?;
  let title = format!("Downloading {}", object);
  let moved = match out {
    Some(path) => {
      let sink = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("failed to create {}", path.display()))?;
      let download = DualStream::new(remote, IoSink::new(sink));
      let mut read = read.with_stream(with_progress(download, title, header.payload_size));
      executor.read(&mut read).await.context("download failed")?
    }
    None => {
      let download = DualStream::new(remote, MemorySink::new());
      let mut read = read.with_stream(with_progress(download, title, header.payload_size));
      executor.read(&mut read).await.context("download failed")?
    }
  };
  eprintln!("Downloaded {} of {} bytes", moved, header.payload_size);

  // Delete
  let delete = params(Operation::Delete, container, &object, credential, gate, cancel);
  executor.delete(&delete).await.context("delete failed")?;
  eprintln!("Deleted object: {}", object);

  Ok(())
}

async fn print_notifications(data_dir: PathBuf) -> Result<()> {
  let store = FsStore::new(&data_dir);
  let records = archived_notifications(&store, None)
    .await
    .context("failed to read archived notifications")?;

  if records.is_empty() {
    eprintln!("No notifications in {}", data_dir.display());
  }
  for record in records {
    println!("{}", serde_json::to_string(&record)?);
  }
  Ok(())
}

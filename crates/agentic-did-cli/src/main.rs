//! AgenticDID CLI — `adid` command.
//!
//! Thin front end over the `agentic-did` library: resolves the keystore
//! directory and passphrase, runs one operation, prints the result.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use agentic_did::auth::{self, ChallengeExpectations, ChallengeOptions};
use agentic_did::credential::{self, CredentialRequest, StatusPurpose, VerifyOptions};
use agentic_did::revocation::{self, RevocationRegistry, StatusListStore};
use agentic_did::{
    did, resolve_passphrase, Did, DidDocument, Identity, IdentityRole, KeyProtection, Keystore,
    PassphraseCandidate, PassphraseOrigin, RotationManager,
};

const PRIMARY_PASSPHRASE_VAR: &str = "AGENTIC_DID_PASSPHRASE";
const ALIAS_PASSPHRASE_VAR: &str = "AGENTIC_DID_KEYSTORE_PASSPHRASE";
const LEGACY_PASSPHRASE_VAR: &str = "AGENT_PASSPHRASE";
const KEYSTORE_DIR_VAR: &str = "AGENTIC_DID_HOME";

// ── Directory helpers ─────────────────────────────────────────────────────────

fn default_keystore_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(KEYSTORE_DIR_VAR) {
        return PathBuf::from(dir);
    }
    let home = std::env::var_os("HOME").unwrap_or_else(|| ".".into());
    PathBuf::from(home).join(".agentic").join("did")
}

// ── Time helpers ──────────────────────────────────────────────────────────────

fn micros_to_datetime(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    chrono::DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("{micros} us"))
}

/// Parse a duration like "90s", "15m", "24h", "7d" or "1h30m" into seconds.
/// A bare number is seconds.
fn parse_duration_secs(s: &str) -> Result<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        if n <= 0 {
            bail!("duration must be > 0");
        }
        return Ok(n);
    }

    let mut total: i64 = 0;
    let mut current = String::new();
    for ch in s.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
            continue;
        }
        let val: i64 = current
            .parse()
            .map_err(|_| anyhow!("invalid duration: {s}"))?;
        current.clear();
        let unit: i64 = match ch {
            'd' => 86_400,
            'h' => 3_600,
            'm' => 60,
            's' => 1,
            _ => bail!("unknown duration unit '{ch}' in '{s}'"),
        };
        total = val
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| anyhow!("duration '{s}' is too large"))?;
    }
    if !current.is_empty() {
        bail!("duration '{s}' is missing a unit (d/h/m/s)");
    }
    if total == 0 {
        bail!("duration must be > 0");
    }
    Ok(total)
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// AgenticDID CLI — manage agent identities, credentials, revocation and
/// key rotation.
#[derive(Parser, Debug)]
#[command(
    name = "adid",
    about = "AgenticDID CLI",
    version,
    long_about = "adid — AgenticDID CLI\n\nCreate did:key identities for owners and agents, issue and verify\nsigned credentials, revoke them, and rotate keys."
)]
struct Cli {
    /// Keystore directory (default: $AGENTIC_DID_HOME or ~/.agentic/did)
    #[arg(long, global = true)]
    keystore: Option<PathBuf>,

    /// Keystore passphrase (prefer the AGENTIC_DID_PASSPHRASE variable)
    #[arg(long, global = true)]
    passphrase: Option<String>,

    /// Store new private keys without encryption
    #[arg(long, global = true, conflicts_with = "passphrase")]
    plaintext: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage identities
    Identity {
        #[command(subcommand)]
        subcommand: IdentityCommands,
    },

    /// Inspect identifiers
    Did {
        #[command(subcommand)]
        subcommand: DidCommands,
    },

    /// Issue a credential
    Issue {
        #[command(subcommand)]
        subcommand: IssueCommands,
    },

    /// Verify a credential token
    Verify {
        /// The token
        token: String,

        /// Accept only these issuers (repeatable)
        #[arg(long = "issuer")]
        issuers: Vec<String>,

        /// Expected subject DID
        #[arg(long)]
        subject: Option<String>,

        /// Expected audience
        #[arg(long)]
        audience: Option<String>,

        /// Expected domain
        #[arg(long)]
        domain: Option<String>,

        /// Also consult the revocation registry in the keystore
        #[arg(long)]
        check_revoked: bool,
    },

    /// Decode a token without verifying it
    Decode {
        token: String,
    },

    /// Revoke a credential token
    Revoke {
        token: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Show the revocation status of a credential token
    Status {
        token: String,
    },

    /// Manage published status lists
    StatusList {
        #[command(subcommand)]
        subcommand: StatusListCommands,
    },

    /// Challenge-response authentication
    Auth {
        #[command(subcommand)]
        subcommand: AuthCommands,
    },

    /// Rotate an identity's key
    Rotate {
        did: String,

        #[arg(long)]
        reason: Option<String>,
    },

    /// Resolve the current DID after rotations
    Current {
        did: String,
    },

    /// Show the rotation chain containing a DID
    History {
        did: String,
    },
}

#[derive(Subcommand, Debug)]
enum IdentityCommands {
    /// Create a new identity
    Create {
        #[arg(long, value_enum)]
        role: RoleArg,

        #[arg(long)]
        name: String,

        /// Owner DID (agents only)
        #[arg(long)]
        owner: Option<String>,
    },

    /// List identities
    List {
        /// Only agents of this owner
        #[arg(long)]
        owner: Option<String>,
    },

    /// Show one identity
    Show {
        did: String,
    },

    /// Delete an identity and its key
    Delete {
        did: String,
    },

    /// Report dangling index entries and orphaned key files
    Check,
}

#[derive(Subcommand, Debug)]
enum DidCommands {
    /// Check an identifier
    Validate {
        identifier: String,
    },

    /// Print the DID document
    Document {
        did: String,
    },
}

#[derive(Subcommand, Debug)]
enum IssueCommands {
    /// Owner asserts it controls an agent
    Ownership {
        #[arg(long)]
        owner: String,

        #[arg(long)]
        agent: String,

        #[command(flatten)]
        common: IssueArgs,
    },

    /// Grant scopes to a subject
    Capability {
        #[arg(long)]
        issuer: String,

        #[arg(long)]
        subject: String,

        /// Granted scope (repeatable)
        #[arg(long = "scope", required = true)]
        scopes: Vec<String>,

        #[command(flatten)]
        common: IssueArgs,
    },
}

#[derive(clap::Args, Debug)]
struct IssueArgs {
    #[arg(long)]
    audience: Option<String>,

    #[arg(long)]
    domain: Option<String>,

    /// Lifetime, e.g. "1h" or "30d"
    #[arg(long)]
    expires: Option<String>,

    /// Allocate a status-list entry for this purpose
    #[arg(long, value_enum)]
    status: Option<PurposeArg>,

    /// Also store the token in the keystore under its credential id
    #[arg(long)]
    save: bool,
}

#[derive(Subcommand, Debug)]
enum StatusListCommands {
    /// Sign and print the current list as a credential
    Publish {
        #[arg(long)]
        issuer: String,

        #[arg(long, value_enum, default_value = "revocation")]
        purpose: PurposeArg,
    },

    /// Set (or with --clear, clear) a status bit
    Set {
        #[arg(long)]
        issuer: String,

        #[arg(long, value_enum, default_value = "revocation")]
        purpose: PurposeArg,

        #[arg(long)]
        index: u64,

        #[arg(long)]
        clear: bool,
    },

    /// Check a credential's status against a published list
    Check {
        /// Credential token carrying a credentialStatus entry
        token: String,

        /// Published status-list credential
        #[arg(long)]
        list: String,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommands {
    /// Print a fresh nonce
    Nonce,

    /// Sign a challenge for a DID in the keystore
    Sign {
        #[arg(long)]
        did: String,

        #[arg(long)]
        nonce: String,

        #[arg(long)]
        audience: Option<String>,

        #[arg(long)]
        domain: Option<String>,

        /// Lifetime, e.g. "2m"
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Verify a signed challenge
    Verify {
        #[arg(long)]
        did: String,

        #[arg(long)]
        payload: String,

        #[arg(long)]
        signature: String,

        #[arg(long)]
        nonce: Option<String>,

        #[arg(long)]
        audience: Option<String>,

        #[arg(long)]
        domain: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    Owner,
    Agent,
}

impl From<RoleArg> for IdentityRole {
    fn from(r: RoleArg) -> Self {
        match r {
            RoleArg::Owner => IdentityRole::Owner,
            RoleArg::Agent => IdentityRole::Agent,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PurposeArg {
    Revocation,
    Suspension,
}

impl From<PurposeArg> for StatusPurpose {
    fn from(p: PurposeArg) -> Self {
        match p {
            PurposeArg::Revocation => StatusPurpose::Revocation,
            PurposeArg::Suspension => StatusPurpose::Suspension,
        }
    }
}

// ── Keystore access ───────────────────────────────────────────────────────────

struct Session {
    dir: PathBuf,
    passphrase: Option<String>,
    plaintext: bool,
    json: bool,
    verbose: bool,
}

impl Session {
    /// Resolve protection from flags and environment, first match wins.
    fn protection(&self) -> Option<KeyProtection> {
        if self.plaintext {
            return Some(KeyProtection::Plaintext);
        }
        let env = |name: &str| std::env::var(name).ok();
        resolve_passphrase(vec![
            PassphraseCandidate::new(
                PassphraseOrigin::Explicit,
                "--passphrase",
                self.passphrase.clone(),
            ),
            PassphraseCandidate::new(
                PassphraseOrigin::Primary,
                PRIMARY_PASSPHRASE_VAR,
                env(PRIMARY_PASSPHRASE_VAR),
            ),
            PassphraseCandidate::new(
                PassphraseOrigin::Alias,
                ALIAS_PASSPHRASE_VAR,
                env(ALIAS_PASSPHRASE_VAR),
            ),
            PassphraseCandidate::new(
                PassphraseOrigin::Legacy,
                LEGACY_PASSPHRASE_VAR,
                env(LEGACY_PASSPHRASE_VAR),
            ),
        ])
        .map(KeyProtection::from)
    }

    /// Keystore for reads and for signing with existing keys.
    fn reader(&self) -> Result<Keystore> {
        let protection = self.protection().unwrap_or(KeyProtection::Plaintext);
        Ok(Keystore::open(&self.dir, protection)?)
    }

    /// Keystore for operations that write.
    fn writer(&self) -> Result<Keystore> {
        let protection = self.protection().ok_or_else(|| {
            anyhow!("no passphrase: set {PRIMARY_PASSPHRASE_VAR}, pass --passphrase, or use --plaintext")
        })?;
        log::debug!(
            "opening keystore {} (encrypted: {})",
            self.dir.display(),
            protection.is_encrypted()
        );
        Keystore::create(&self.dir, protection)
            .with_context(|| format!("failed to open keystore at {}", self.dir.display()))
    }

    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce()) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            text();
        }
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    let ctx = Session {
        dir: cli.keystore.unwrap_or_else(default_keystore_dir),
        passphrase: cli.passphrase,
        plaintext: cli.plaintext,
        json: cli.json,
        verbose: cli.verbose,
    };

    let result = match cli.command {
        Commands::Identity { subcommand } => match subcommand {
            IdentityCommands::Create { role, name, owner } => {
                cmd_identity_create(&ctx, role.into(), &name, owner.as_deref())
            }
            IdentityCommands::List { owner } => cmd_identity_list(&ctx, owner.as_deref()),
            IdentityCommands::Show { did } => cmd_identity_show(&ctx, &did),
            IdentityCommands::Delete { did } => cmd_identity_delete(&ctx, &did),
            IdentityCommands::Check => cmd_identity_check(&ctx),
        },
        Commands::Did { subcommand } => match subcommand {
            DidCommands::Validate { identifier } => cmd_did_validate(&ctx, &identifier),
            DidCommands::Document { did } => cmd_did_document(&ctx, &did),
        },
        Commands::Issue { subcommand } => match subcommand {
            IssueCommands::Ownership {
                owner,
                agent,
                common,
            } => parse_did(&owner).and_then(|owner| {
                let agent = parse_did(&agent)?;
                cmd_issue(&ctx, credential::ownership_credential(&owner, &agent), &common)
            }),
            IssueCommands::Capability {
                issuer,
                subject,
                scopes,
                common,
            } => parse_did(&issuer).and_then(|issuer| {
                let subject = parse_did(&subject)?;
                cmd_issue(
                    &ctx,
                    credential::capability_credential(&issuer, &subject, scopes),
                    &common,
                )
            }),
        },
        Commands::Verify {
            token,
            issuers,
            subject,
            audience,
            domain,
            check_revoked,
        } => {
            let mut options = VerifyOptions::new();
            if !issuers.is_empty() {
                options = options.trusted_issuers(issuers);
            }
            options.subject = subject;
            options.audience = audience;
            options.domain = domain;
            cmd_verify(&ctx, &token, &options, check_revoked)
        }
        Commands::Decode { token } => cmd_decode(&ctx, &token),
        Commands::Revoke { token, reason } => cmd_revoke(&ctx, &token, reason.as_deref()),
        Commands::Status { token } => cmd_status(&ctx, &token),
        Commands::StatusList { subcommand } => match subcommand {
            StatusListCommands::Publish { issuer, purpose } => {
                cmd_status_list_publish(&ctx, &issuer, purpose.into())
            }
            StatusListCommands::Set {
                issuer,
                purpose,
                index,
                clear,
            } => cmd_status_list_set(&ctx, &issuer, purpose.into(), index, !clear),
            StatusListCommands::Check { token, list } => cmd_status_list_check(&ctx, &token, &list),
        },
        Commands::Auth { subcommand } => match subcommand {
            AuthCommands::Nonce => cmd_auth_nonce(&ctx),
            AuthCommands::Sign {
                did,
                nonce,
                audience,
                domain,
                ttl,
            } => cmd_auth_sign(&ctx, &did, &nonce, audience, domain, ttl.as_deref()),
            AuthCommands::Verify {
                did,
                payload,
                signature,
                nonce,
                audience,
                domain,
            } => {
                let expectations = ChallengeExpectations {
                    nonce,
                    audience,
                    domain,
                };
                cmd_auth_verify(&ctx, &did, &payload, &signature, &expectations)
            }
        },
        Commands::Rotate { did, reason } => cmd_rotate(&ctx, &did, reason.as_deref()),
        Commands::Current { did } => cmd_current(&ctx, &did),
        Commands::History { did } => cmd_history(&ctx, &did),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn parse_did(s: &str) -> Result<Did> {
    Did::parse(s).with_context(|| format!("invalid DID '{s}'"))
}

fn print_identity(identity: &Identity, verbose: bool) {
    println!("{} ({})", identity.name, identity.role.as_str());
    println!("  DID:     {}", identity.did);
    if let Some(owner) = &identity.owner_did {
        println!("  Owner:   {owner}");
    }
    if verbose {
        println!("  Created: {}", micros_to_datetime(identity.created_at));
    }
}

// ── Identity commands ─────────────────────────────────────────────────────────

/// `adid identity create --role ROLE --name NAME [--owner DID]`
fn cmd_identity_create(
    ctx: &Session,
    role: IdentityRole,
    name: &str,
    owner: Option<&str>,
) -> Result<()> {
    let ks = ctx.writer()?;
    let owner = owner.map(parse_did).transpose()?;
    let identity = ks
        .create_identity(role, name, owner.as_ref())
        .context("failed to create identity")?;
    ctx.emit(&identity, || {
        println!("Created identity");
        print_identity(&identity, true);
    })
}

/// `adid identity list [--owner DID]`
fn cmd_identity_list(ctx: &Session, owner: Option<&str>) -> Result<()> {
    let ks = ctx.reader()?;
    let identities = match owner {
        Some(owner) => ks.get_agents_for_owner(owner)?,
        None => ks.list_identities()?,
    };
    ctx.emit(&identities, || {
        if identities.is_empty() {
            println!("No identities in {}", ctx.dir.display());
        }
        for identity in &identities {
            print_identity(identity, ctx.verbose);
        }
    })
}

/// `adid identity show DID`
fn cmd_identity_show(ctx: &Session, did: &str) -> Result<()> {
    let ks = ctx.reader()?;
    let identity = ks.require_identity(did)?;
    let encrypted = ks.is_encrypted(did).ok();
    let deprecated = RotationManager::new(&ks).is_deprecated(did)?;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Shown<'a> {
        #[serde(flatten)]
        identity: &'a Identity,
        encrypted: Option<bool>,
        deprecated: bool,
    }
    let shown = Shown {
        identity: &identity,
        encrypted,
        deprecated,
    };
    ctx.emit(&shown, || {
        print_identity(&identity, true);
        match encrypted {
            Some(true) => println!("  Key:     encrypted"),
            Some(false) => println!("  Key:     plaintext"),
            None => println!("  Key:     MISSING"),
        }
        if deprecated {
            println!("  Status:  deprecated (rotated)");
        }
    })
}

/// `adid identity delete DID`
fn cmd_identity_delete(ctx: &Session, did: &str) -> Result<()> {
    let ks = ctx.writer()?;
    if !ks.delete_identity(did)? {
        bail!("identity not found: {did}");
    }
    ctx.emit(&serde_json::json!({ "deleted": did }), || {
        println!("Deleted {did}");
    })
}

/// `adid identity check`
fn cmd_identity_check(ctx: &Session) -> Result<()> {
    let report = ctx.reader()?.check_integrity()?;
    ctx.emit(&report, || {
        if report.is_clean() {
            println!("Keystore is consistent");
        }
        for did in &report.dangling {
            println!("  dangling index entry: {did}");
        }
        for path in &report.orphaned_key_files {
            println!("  orphaned key file:    {}", path.display());
        }
    })
}

// ── DID commands ──────────────────────────────────────────────────────────────

/// `adid did validate IDENTIFIER`
fn cmd_did_validate(ctx: &Session, identifier: &str) -> Result<()> {
    let validation = did::validate(identifier);
    ctx.emit(&validation, || match &validation.reason {
        None => println!("valid"),
        Some(reason) => println!("invalid: {reason}"),
    })?;
    if !validation.valid {
        std::process::exit(2);
    }
    Ok(())
}

/// `adid did document DID`
fn cmd_did_document(_ctx: &Session, did: &str) -> Result<()> {
    let doc = DidDocument::resolve(&parse_did(did)?)?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

// ── Credential commands ───────────────────────────────────────────────────────

/// `adid issue ownership|capability ...`
fn cmd_issue(ctx: &Session, mut request: CredentialRequest, args: &IssueArgs) -> Result<()> {
    if let Some(audience) = &args.audience {
        request = request.with_audience(audience);
    }
    if let Some(domain) = &args.domain {
        request = request.with_domain(domain);
    }
    if let Some(expires) = &args.expires {
        request = request.expires_in(parse_duration_secs(expires)?);
    }

    let needs_writer = args.status.is_some() || args.save;
    let ks = if needs_writer { ctx.writer()? } else { ctx.reader()? };

    if let Some(purpose) = args.status {
        let entry = StatusListStore::new(&ks).allocate_entry(&request.issuer, purpose.into())?;
        request = request.with_status(entry);
    }

    let token = credential::issue(&ks, &request).context("failed to issue credential")?;
    let id = credential::credential_id(&token).unwrap_or_default();
    if args.save {
        ks.store_credential(&id, &serde_json::json!({ "token": token }))?;
    }

    ctx.emit(&serde_json::json!({ "id": id, "token": token }), || {
        println!("{token}");
        if ctx.verbose {
            eprintln!("credential id: {id}");
        }
    })
}

/// `adid verify TOKEN [--issuer DID]... [--subject DID] [--audience A] [--domain D]`
fn cmd_verify(
    ctx: &Session,
    token: &str,
    options: &VerifyOptions,
    check_revoked: bool,
) -> Result<()> {
    let mut result = credential::verify(token, options);

    if result.valid && check_revoked {
        if let (Some(payload), Some(id)) = (&result.payload, credential::credential_id(token)) {
            let ks = ctx.reader()?;
            if RevocationRegistry::new(&ks).is_revoked(&payload.iss, &id)? {
                result.valid = false;
                result.reason = Some("Credential has been revoked".into());
            }
        }
    }

    ctx.emit(&result, || match (&result.reason, &result.payload) {
        (None, Some(payload)) => {
            println!("valid");
            println!("  Issuer:  {}", payload.iss);
            println!("  Subject: {}", payload.sub);
            if let Some(t) = payload.vc.primary_type() {
                println!("  Type:    {t}");
            }
        }
        (reason, _) => println!("invalid: {}", reason.as_deref().unwrap_or("unknown")),
    })?;
    if !result.valid {
        std::process::exit(2);
    }
    Ok(())
}

/// `adid decode TOKEN`
fn cmd_decode(_ctx: &Session, token: &str) -> Result<()> {
    let decoded = credential::decode(token).ok_or_else(|| anyhow!("Malformed token"))?;
    let out = serde_json::json!({
        "header": decoded.header,
        "payload": decoded.payload,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// `adid revoke TOKEN [--reason R]`
fn cmd_revoke(ctx: &Session, token: &str, reason: Option<&str>) -> Result<()> {
    let ks = ctx.writer()?;
    let record = RevocationRegistry::new(&ks).revoke_token(token, reason)?;
    ctx.emit(&record, || {
        println!("Revoked {}", record.credential_id);
    })
}

/// `adid status TOKEN`
fn cmd_status(ctx: &Session, token: &str) -> Result<()> {
    let decoded = credential::decode(token).ok_or_else(|| anyhow!("Malformed token"))?;
    let id = credential::credential_id(token).ok_or_else(|| anyhow!("Malformed token"))?;
    let ks = ctx.reader()?;
    let status = RevocationRegistry::new(&ks).get_status(&decoded.payload.iss, &id)?;
    ctx.emit(&status, || match &status.record {
        Some(r) => println!(
            "revoked at {}{}",
            micros_to_datetime(r.revoked_at),
            r.reason
                .as_deref()
                .map(|reason| format!(" ({reason})"))
                .unwrap_or_default()
        ),
        None => println!("not revoked"),
    })
}

// ── Status-list commands ──────────────────────────────────────────────────────

/// `adid status-list publish --issuer DID [--purpose P]`
fn cmd_status_list_publish(ctx: &Session, issuer: &str, purpose: StatusPurpose) -> Result<()> {
    let ks = ctx.reader()?;
    let token = revocation::issue_status_list_credential(&ks, &parse_did(issuer)?, purpose)?;
    ctx.emit(&serde_json::json!({ "token": token }), || println!("{token}"))
}

/// `adid status-list set --issuer DID --index N [--clear]`
fn cmd_status_list_set(
    ctx: &Session,
    issuer: &str,
    purpose: StatusPurpose,
    index: u64,
    flagged: bool,
) -> Result<()> {
    let ks = ctx.writer()?;
    StatusListStore::new(&ks).set_status(&parse_did(issuer)?, purpose, index, flagged)?;
    ctx.emit(
        &serde_json::json!({ "index": index, "purpose": purpose, "set": flagged }),
        || {
            println!(
                "{} {purpose} bit {index}",
                if flagged { "Set" } else { "Cleared" }
            )
        },
    )
}

/// `adid status-list check TOKEN --list STATUS_LIST_TOKEN`
fn cmd_status_list_check(ctx: &Session, token: &str, list: &str) -> Result<()> {
    let decoded = credential::decode(token).ok_or_else(|| anyhow!("Malformed token"))?;
    let status = decoded
        .payload
        .vc
        .credential_status
        .ok_or_else(|| anyhow!("credential has no credentialStatus entry"))?;
    let flagged = revocation::check_credential_status(&status, list)?;
    ctx.emit(
        &serde_json::json!({ "purpose": status.status_purpose, "flagged": flagged }),
        || {
            println!(
                "{}: {}",
                status.status_purpose,
                if flagged { "set" } else { "not set" }
            )
        },
    )
}

// ── Auth commands ─────────────────────────────────────────────────────────────

/// `adid auth nonce`
fn cmd_auth_nonce(ctx: &Session) -> Result<()> {
    let nonce = auth::generate_nonce();
    ctx.emit(&serde_json::json!({ "nonce": nonce }), || println!("{nonce}"))
}

/// `adid auth sign --did DID --nonce N [--audience A] [--domain D] [--ttl T]`
fn cmd_auth_sign(
    ctx: &Session,
    did: &str,
    nonce: &str,
    audience: Option<String>,
    domain: Option<String>,
    ttl: Option<&str>,
) -> Result<()> {
    let ks = ctx.reader()?;
    let mut options = ChallengeOptions::from_config(ks.config());
    if let Some(ttl) = ttl {
        options.ttl_secs = parse_duration_secs(ttl)?;
    }
    options.audience = audience;
    options.domain = domain;

    let payload = auth::create_payload(&parse_did(did)?, nonce, &options);
    let signed = auth::sign_challenge(&ks, &payload).context("failed to sign challenge")?;
    ctx.emit(&signed, || {
        println!("payload:   {}", signed.encoded_payload);
        println!("signature: {}", signed.signature);
    })
}

/// `adid auth verify --did DID --payload P --signature S [--nonce N]`
fn cmd_auth_verify(
    ctx: &Session,
    did: &str,
    payload: &str,
    signature: &str,
    expectations: &ChallengeExpectations,
) -> Result<()> {
    let result = auth::verify_challenge(did, payload, signature, expectations);
    ctx.emit(&result, || match &result.reason {
        None => println!("valid"),
        Some(reason) => println!("invalid: {reason}"),
    })?;
    if !result.valid {
        std::process::exit(2);
    }
    Ok(())
}

// ── Rotation commands ─────────────────────────────────────────────────────────

/// `adid rotate DID [--reason R]`
fn cmd_rotate(ctx: &Session, did: &str, reason: Option<&str>) -> Result<()> {
    let ks = ctx.writer()?;
    let record = RotationManager::new(&ks)
        .rotate_key(did, reason)
        .context("failed to rotate key")?;
    ctx.emit(&record, || {
        println!("Identity rotated successfully");
        println!("  Old DID: {}", record.old_did);
        println!("  New DID: {}", record.new_did);
    })
}

/// `adid current DID`
fn cmd_current(ctx: &Session, did: &str) -> Result<()> {
    let ks = ctx.reader()?;
    let current = RotationManager::new(&ks).get_current_did(did)?;
    ctx.emit(&serde_json::json!({ "did": did, "current": current }), || {
        println!("{current}")
    })
}

/// `adid history DID`
fn cmd_history(ctx: &Session, did: &str) -> Result<()> {
    let ks = ctx.reader()?;
    let history = RotationManager::new(&ks).rotation_history(did)?;
    ctx.emit(&history, || {
        if history.is_empty() {
            println!("No rotations for {did}");
        }
        for (i, r) in history.iter().enumerate() {
            println!(
                "  [{}] {} -> {} at {}",
                i + 1,
                r.old_did,
                r.new_did,
                micros_to_datetime(r.rotated_at)
            );
        }
    })
}

//! Command line host for the ndef-hce tag emulator
//!
//! Manages saved tags and the emulation selection in the JSON store, and
//! replays command APDUs through the emulator.
//!
//! Usage: ndef-hce <command> [args...]
//!
//! APDUs for `replay` are read from stdin, one hex string per line. Each
//! response is printed as hex followed by a `#` comment naming its status:
//!   printf '00A4040007D276000085010100\n' | ndef-hce replay

use std::env;
use std::io::{self, BufRead, Write};
use std::process;
use std::sync::Arc;

use ndef_hce::apdu::{Response, SW};
use ndef_hce::config::Config;
use ndef_hce::ndef::{self, builder, MessageKind, NdefRecord, VCard};
use ndef_hce::selector::EmulationSelector;
use ndef_hce::store::{JsonTagStore, TagData, TagId};
use ndef_hce::type4::CapabilityContainer;
use ndef_hce::JsonTagHostService;

const USAGE: &str = "Usage: ndef-hce <command> [args...]

Commands:
  list                               List saved tags
  show <id>                          Decode the NDEF message of a tag
  add <url|text|phone|email> <name> <content>
                                     Author a new tag
  add-contact <name> <contact> <phone> <email>
                                     Author a vCard tag
  emulate <id>                       Emulate a saved tag
  stop                               Stop emulating
  rename <id> <name>                 Rename a tag
  delete <id>                        Delete a tag
  cc                                 Print the Capability Container
  replay                             Send hex APDUs from stdin to the emulator";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        process::exit(2);
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match command.as_str() {
        "list" => list(&config),
        "show" => with_arg(&args, 1).and_then(|id| show(&config, id)),
        "add" => match (args.get(1), args.get(2), args.get(3)) {
            (Some(kind), Some(name), Some(content)) => add(&config, kind, name, content),
            _ => Err(USAGE.to_string()),
        },
        "add-contact" => match (args.get(1), args.get(2)) {
            (Some(name), Some(contact)) => add_contact(
                &config,
                name,
                contact,
                args.get(3).map(String::as_str).unwrap_or(""),
                args.get(4).map(String::as_str).unwrap_or(""),
            ),
            _ => Err(USAGE.to_string()),
        },
        "emulate" => with_arg(&args, 1).and_then(|id| emulate(&config, Some(TagId::from(id)))),
        "stop" => emulate(&config, None),
        "rename" => match (args.get(1), args.get(2)) {
            (Some(id), Some(name)) => rename(&config, id, name),
            _ => Err(USAGE.to_string()),
        },
        "delete" => with_arg(&args, 1).and_then(|id| delete(&config, id)),
        "cc" => {
            let cc = CapabilityContainer::with_max_ndef_size(config.max_ndef_size);
            println!("{}", hex::encode_upper(cc.to_bytes()));
            Ok(())
        }
        "replay" => replay(&config),
        "help" | "-h" | "--help" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => Err(format!("Unknown command: {}\n\n{}", other, USAGE)),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn with_arg(args: &[String], index: usize) -> Result<&str, String> {
    args.get(index)
        .map(String::as_str)
        .ok_or_else(|| USAGE.to_string())
}

fn open_store(config: &Config) -> JsonTagStore {
    JsonTagStore::open(&config.storage_dir)
}

fn list(config: &Config) -> Result<(), String> {
    let store = open_store(config);
    let emulating = store.current();
    let tags = store.all_tags();
    if tags.is_empty() {
        println!("No saved tags in {}", store.state_file().display());
        return Ok(());
    }
    for tag in tags {
        let marker = if emulating.as_ref() == Some(&tag.uid) { "*" } else { " " };
        let origin = if tag.uid.is_artificial() { "authored" } else { "scanned" };
        println!(
            "{} {:<18} {:<18} {:<8} {:?}",
            marker, tag.uid, tag.name, origin, tag.tag_type
        );
    }
    Ok(())
}

fn show(config: &Config, id: &str) -> Result<(), String> {
    let store = open_store(config);
    let tag = store
        .tag(&TagId::from(id))
        .ok_or_else(|| format!("No tag with id {}", id))?;
    println!("{} ({:?})", tag.name, tag.tag_type);

    let Some(file) = tag.ndef_message.as_deref() else {
        println!("  no NDEF message");
        return Ok(());
    };
    println!("  file: {}", hex::encode_upper(file));

    let message = ndef::file::unwrap(file).map_err(|e| e.to_string())?;
    for raw in ndef::parse_message(message).map_err(|e| e.to_string())? {
        match NdefRecord::try_from(&raw) {
            Ok(NdefRecord::Text { language, text }) => println!("  text [{}]: {}", language, text),
            Ok(NdefRecord::Uri(uri)) => println!("  uri: {}", uri),
            Ok(NdefRecord::Mime { mime_type, payload }) => {
                if mime_type == ndef::vcard::VCARD_MIME {
                    let card = VCard::parse(&String::from_utf8_lossy(&payload));
                    println!("  vcard: {:?}", card);
                } else {
                    println!("  {}: {} bytes", mime_type, payload.len());
                }
            }
            Err(e) => println!("  {:?} record ({} bytes): {}", raw.header.tnf, raw.payload.len(), e),
        }
    }
    Ok(())
}

fn add(config: &Config, kind: &str, name: &str, content: &str) -> Result<(), String> {
    let kind: MessageKind = kind.parse()?;
    let file = kind.build(content).map_err(|e| e.to_string())?;
    let tag = TagData::authored(name, file);
    let id = tag.uid.clone();
    open_store(config).save_tag(tag).map_err(|e| e.to_string())?;
    println!("{}", id);
    Ok(())
}

fn add_contact(config: &Config, name: &str, contact: &str, phone: &str, email: &str) -> Result<(), String> {
    let card = VCard::new(contact, phone, email);
    if card.is_empty() {
        return Err("A contact needs at least a name, phone or e-mail".to_string());
    }
    let file = builder::contact_message(&card).map_err(|e| e.to_string())?;
    let tag = TagData::authored_contact(name, &card, file);
    let id = tag.uid.clone();
    open_store(config).save_tag(tag).map_err(|e| e.to_string())?;
    println!("{}", id);
    Ok(())
}

fn emulate(config: &Config, id: Option<TagId>) -> Result<(), String> {
    let store = open_store(config);
    if let Some(id) = &id {
        if store.tag(id).is_none() {
            return Err(format!("No tag with id {}", id));
        }
    }
    store.set_emulating(id).map_err(|e| e.to_string())
}

fn rename(config: &Config, id: &str, name: &str) -> Result<(), String> {
    match open_store(config).rename_tag(&TagId::from(id), name) {
        Ok(true) => Ok(()),
        Ok(false) => Err(format!("No tag with id {}", id)),
        Err(e) => Err(e.to_string()),
    }
}

fn delete(config: &Config, id: &str) -> Result<(), String> {
    match open_store(config).delete_tag(&TagId::from(id)) {
        Ok(true) => Ok(()),
        Ok(false) => Err(format!("No tag with id {}", id)),
        Err(e) => Err(e.to_string()),
    }
}

fn replay(config: &Config) -> Result<(), String> {
    let store = Arc::new(open_store(config));
    let mut service = JsonTagHostService::from_store(store, config);
    service.activate();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| e.to_string())?;
        let text: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let apdu = hex::decode(&text).map_err(|e| format!("Invalid hex {:?}: {}", line, e))?;
        let raw = service.process_command_apdu(&apdu);
        let status = Response::from_bytes(&raw)
            .map(|response| SW::describe(response.sw()))
            .unwrap_or("no status word");
        writeln!(out, "{}  # {}", hex::encode_upper(&raw), status).map_err(|e| e.to_string())?;
    }

    service.deactivate();
    Ok(())
}

//! Offline tool: copy an ERC-721 collection's metadata into a base-tier file.
//!
//! Walks `0..totalSupply()` on an ERC-721 Enumerable contract over plain
//! JSON-RPC `eth_call`, resolves each token's metadata URI (rewriting
//! `ipfs://` to an HTTP gateway URL), and stores the fetched records. A
//! token whose URI lookup or fetch fails (burned, gateway gone) gets a
//! `<BURNED> #<id>` placeholder so the collection file stays dense.

use crate::{cli::FetchArgs, config::ServiceConfig, debug, log};
use anyhow::{Context, Result, bail};
use serde_json::{Map, Value, json};
use std::fs;

// Fixed ERC-721 Enumerable selectors (keccak-256 of the signature, first 4 bytes)
const TOTAL_SUPPLY: &str = "0x18160ddd"; // totalSupply()
const TOKEN_URI: &str = "0xc87b56dd"; // tokenURI(uint256)

pub fn run(args: &FetchArgs, config: &ServiceConfig) -> Result<()> {
    let rpc_url = args
        .rpc_url
        .clone()
        .or_else(|| std::env::var("ETHEREUM_RPC_URL").ok())
        .context("no JSON-RPC endpoint: pass --rpc-url or set ETHEREUM_RPC_URL")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    runtime.block_on(fetch_collection(args, config, &rpc_url))
}

async fn fetch_collection(args: &FetchArgs, config: &ServiceConfig, rpc_url: &str) -> Result<()> {
    let client = reqwest::Client::builder().build()?;

    let supply_word = eth_call(&client, rpc_url, &args.contract, TOTAL_SUPPLY, None).await?;
    let total = decode_uint(&supply_word).context("bad totalSupply() return")?;
    log!("fetch"; "total supply: {total}");

    let mut metadata = Map::new();
    for token_id in 0..total {
        let record = match fetch_token(&client, rpc_url, args, token_id).await {
            Ok(record) => record,
            Err(e) => {
                log!("fetch"; "token {token_id}: {e:#}");
                json!({"name": format!("<BURNED> #{token_id}")})
            }
        };
        metadata.insert(token_id.to_string(), record);
        debug!("fetch"; "processed token {} ({}/{})", token_id, token_id + 1, total);
    }

    let out_dir = config.metadata.base_dir.join(&args.project);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let out_path = out_dir.join(format!("{}.json", args.collection));
    fs::write(&out_path, serde_json::to_string_pretty(&metadata)?)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    log!("fetch"; "{} record(s) -> {}", total, out_path.display());
    Ok(())
}

/// Resolve one token's URI and fetch the metadata behind it.
async fn fetch_token(
    client: &reqwest::Client,
    rpc_url: &str,
    args: &FetchArgs,
    token_id: u64,
) -> Result<Value> {
    let uri_word = eth_call(client, rpc_url, &args.contract, TOKEN_URI, Some(token_id)).await?;
    let uri = decode_string(&uri_word).context("bad tokenURI() return")?;
    let url = rewrite_ipfs(&uri, &args.ipfs_gateway);
    debug!("fetch"; "token {} uri {}", token_id, url);

    let record = client
        .get(&url)
        .send()
        .await?
        .error_for_status()?
        .json::<Value>()
        .await
        .with_context(|| format!("metadata at {url} was not JSON"))?;
    Ok(record)
}

/// One `eth_call` round trip; returns the raw hex result word(s).
async fn eth_call(
    client: &reqwest::Client,
    rpc_url: &str,
    contract: &str,
    selector: &str,
    arg: Option<u64>,
) -> Result<String> {
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_call",
        "params": [{"to": contract, "data": encode_call(selector, arg)}, "latest"],
    });

    let response: Value = client
        .post(rpc_url)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if let Some(error) = response.get("error") {
        bail!("rpc error: {error}");
    }
    response
        .get("result")
        .and_then(Value::as_str)
        .map(str::to_string)
        .context("rpc response missing result")
}

/// Selector plus one optional uint256 argument, ABI-encoded.
fn encode_call(selector: &str, arg: Option<u64>) -> String {
    match arg {
        Some(value) => format!("{selector}{value:064x}"),
        None => selector.to_string(),
    }
}

/// Decode a single uint256 return word into u64.
fn decode_uint(word: &str) -> Result<u64> {
    let hex_digits = word.strip_prefix("0x").unwrap_or(word);
    if hex_digits.len() != 64 {
        bail!("expected a 32-byte word, got {} hex digits", hex_digits.len());
    }
    let (high, low) = hex_digits.split_at(48);
    if high.bytes().any(|b| b != b'0') {
        bail!("uint256 value overflows u64");
    }
    u64::from_str_radix(low, 16).context("invalid hex in uint256 word")
}

/// Decode an ABI-encoded dynamic string return (offset word, length word,
/// then UTF-8 bytes).
fn decode_string(data: &str) -> Result<String> {
    let bytes = hex::decode(data.strip_prefix("0x").unwrap_or(data))
        .context("invalid hex in string return")?;

    let offset = abi_word_as_usize(&bytes, 0).context("bad string offset")?;
    let length = abi_word_as_usize(&bytes, offset).context("bad string length")?;
    let start = offset + 32;
    let end = start
        .checked_add(length)
        .filter(|end| *end <= bytes.len())
        .context("string length out of bounds")?;

    String::from_utf8(bytes[start..end].to_vec()).context("string return was not UTF-8")
}

/// Read one 32-byte big-endian word at `offset` as usize.
fn abi_word_as_usize(bytes: &[u8], offset: usize) -> Option<usize> {
    let word = bytes.get(offset..offset + 32)?;
    if word[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut value = 0usize;
    for b in &word[24..] {
        value = (value << 8) | *b as usize;
    }
    Some(value)
}

/// Rewrite `ipfs://CID` URIs to an HTTP gateway URL; other schemes pass
/// through unchanged.
fn rewrite_ipfs(uri: &str, gateway: &str) -> String {
    match uri.strip_prefix("ipfs://") {
        Some(cid) => format!("{gateway}{cid}"),
        None => uri.to_string(),
    }
}

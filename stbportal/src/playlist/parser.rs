use super::types::ChannelRecord;

const EXTINF: &str = "#EXTINF:";
const LOGO_ATTR: &str = "tvg-logo=\"";

/// Metadata from an `#EXTINF` line still waiting for its stream line.
struct PendingEntry {
    number: u32,
    name: String,
    logo: String,
}

/**
    Parse an M3U document into channel records, in document order.

    Every `#EXTINF` line opens an entry numbered from a counter starting at 1;
    the next non-comment line completes it. An entry that is never completed
    (superseded by another `#EXTINF`, or cut off at the end of input) is
    dropped, but its number stays consumed, so ids may have gaps.

    Never fails: text that is not a playlist just yields no channels.
*/
pub fn parse_playlist(text: &str) -> Vec<ChannelRecord> {
    let mut channels = Vec::new();
    let mut pending: Option<PendingEntry> = None;
    let mut counter: u32 = 1;

    for line in text.lines() {
        let line = line.trim();

        if line.starts_with(EXTINF) {
            pending = Some(PendingEntry {
                number: counter,
                name: extract_name(line).unwrap_or_else(|| format!("Channel {}", counter)),
                logo: extract_logo(line).unwrap_or_default(),
            });
            counter += 1;
        } else if !line.is_empty()
            && !line.starts_with('#')
            && let Some(entry) = pending.take()
        {
            channels.push(ChannelRecord::new(
                entry.number,
                entry.name,
                entry.logo,
                line.to_string(),
            ));
        }
    }

    channels
}

/// Text after the last comma, if any remains once trimmed.
fn extract_name(line: &str) -> Option<String> {
    let (_, name) = line.rsplit_once(',')?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// First quoted, non-empty `tvg-logo` value on the line.
fn extract_logo(line: &str) -> Option<String> {
    line.match_indices(LOGO_ATTR).find_map(|(at, _)| {
        let rest = &line[at + LOGO_ATTR.len()..];
        let end = rest.find('"')?;
        (end > 0).then(|| rest[..end].to_string())
    })
}

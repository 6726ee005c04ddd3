// Message formatting helpers shared by commands and the message filter.

/// Discord rejects messages longer than this many characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Split text into messages that each fit Discord's length limit.
pub fn split_for_discord(text: &str) -> Vec<String> {
    split_on_lines(text, DISCORD_MESSAGE_LIMIT)
}

/// Split text into chunks of at most `limit` characters, breaking between
/// lines where possible and inside a line only when it is too long by itself.
fn split_on_lines(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        let separator = usize::from(!current.is_empty());

        if !current.is_empty() && current_len + separator + line_len > limit {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

use crate::properties::PropertyMap;
use std::borrow::Cow;
use tracing::warn;

/// Errors produced while decoding property text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
	#[error("Malformed \\uxxxx encoding on line {line}")]
	MalformedUnicodeEscape { line: usize },
}

/// Decode raw resource bytes as property text.
///
/// UTF-8 content is read as such, with a leading byte-order mark ignored.
/// Anything else is read as ISO-8859-1, so every byte sequence is text.
pub fn parse_properties_bytes(bytes: &[u8]) -> Result<PropertyMap, ParseError> {
	let content = match std::str::from_utf8(bytes) {
		Ok(text) => Cow::Borrowed(text.strip_prefix('\u{feff}').unwrap_or(text)),
		Err(_) => Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect::<String>()),
	};
	parse_properties_str(&content)
}

/// Decode property text into a key/value map.
///
/// Later entries overwrite earlier ones with the same key.
pub fn parse_properties_str(content: &str) -> Result<PropertyMap, ParseError> {
	let lines = physical_lines(content);
	let mut map = PropertyMap::new();
	let mut index = 0;

	while index < lines.len() {
		let first = lines[index].trim_start_matches(is_blank);
		let line_number = index + 1;
		index += 1;

		if first.is_empty() || first.starts_with('#') || first.starts_with('!') {
			continue;
		}

		// Join continuation lines into one logical line
		let mut logical = String::new();
		let mut current = first;
		while ends_with_continuation(current) {
			logical.push_str(&current[..current.len() - 1]);
			match lines.get(index) {
				Some(next) => {
					current = next.trim_start_matches(is_blank);
					index += 1;
				}
				None => {
					current = "";
					break;
				}
			}
		}
		logical.push_str(current);

		let (key, value) = parse_entry(&logical, line_number)?;
		map.insert(key, value);
	}

	Ok(map)
}

/// Split content on `\n`, `\r` or `\r\n`.
fn physical_lines(content: &str) -> Vec<&str> {
	let mut lines = Vec::new();
	let mut start = 0;
	let bytes = content.as_bytes();
	let mut i = 0;

	while i < bytes.len() {
		match bytes[i] {
			b'\n' => {
				lines.push(&content[start..i]);
				start = i + 1;
			}
			b'\r' => {
				lines.push(&content[start..i]);
				if bytes.get(i + 1) == Some(&b'\n') {
					i += 1;
				}
				start = i + 1;
			}
			_ => {}
		}
		i += 1;
	}

	if start < content.len() {
		lines.push(&content[start..]);
	}

	lines
}

fn is_blank(c: char) -> bool {
	c == ' ' || c == '\t' || c == '\u{c}'
}

/// A line continues when it ends with an odd number of backslashes.
fn ends_with_continuation(line: &str) -> bool {
	line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

/// Split a logical line into its decoded key and value.
fn parse_entry(logical: &str, line: usize) -> Result<(String, String), ParseError> {
	let chars: Vec<char> = logical.chars().collect();
	let mut key_len = 0;
	let mut value_start = chars.len();
	let mut has_separator = false;
	let mut preceding_backslash = false;

	while key_len < chars.len() {
		let c = chars[key_len];
		if !preceding_backslash && (c == '=' || c == ':') {
			value_start = key_len + 1;
			has_separator = true;
			break;
		}
		if !preceding_backslash && is_blank(c) {
			value_start = key_len + 1;
			break;
		}
		preceding_backslash = c == '\\' && !preceding_backslash;
		key_len += 1;
	}

	while value_start < chars.len() {
		let c = chars[value_start];
		if !is_blank(c) {
			if !has_separator && (c == '=' || c == ':') {
				has_separator = true;
			} else {
				break;
			}
		}
		value_start += 1;
	}

	let key = unescape(&chars[..key_len], line)?;
	let value = unescape(&chars[value_start..], line)?;
	Ok((key, value))
}

/// Decode backslash escapes in a key or value segment.
fn unescape(segment: &[char], line: usize) -> Result<String, ParseError> {
	let mut out = String::with_capacity(segment.len());
	let mut i = 0;

	while i < segment.len() {
		let c = segment[i];
		i += 1;
		if c != '\\' {
			out.push(c);
			continue;
		}

		let Some(&escaped) = segment.get(i) else {
			break;
		};
		i += 1;

		match escaped {
			'u' => {
				let unit = read_hex4(segment, i, line)?;
				i += 4;
				if let Some(decoded) = char::from_u32(u32::from(unit)) {
					out.push(decoded);
					continue;
				}

				// High surrogate pairs with a directly following escaped low surrogate
				let is_high = (0xD800..0xDC00).contains(&unit);
				let next_is_escape = segment.get(i) == Some(&'\\') && segment.get(i + 1) == Some(&'u');
				if is_high && next_is_escape {
					let low = read_hex4(segment, i + 2, line)?;
					if let Some(Ok(decoded)) = char::decode_utf16([unit, low]).next() {
						out.push(decoded);
						i += 6;
						continue;
					}
				}

				warn!(line, unit = %format!("{unit:04X}"), "Replaced unpaired surrogate");
				out.push(char::REPLACEMENT_CHARACTER);
			}
			't' => out.push('\t'),
			'n' => out.push('\n'),
			'r' => out.push('\r'),
			'f' => out.push('\u{c}'),
			other => out.push(other),
		}
	}

	Ok(out)
}

fn read_hex4(segment: &[char], start: usize, line: usize) -> Result<u16, ParseError> {
	let digits = segment
		.get(start..start + 4)
		.ok_or(ParseError::MalformedUnicodeEscape { line })?;

	let mut value: u16 = 0;
	for digit in digits {
		let nibble = digit
			.to_digit(16)
			.ok_or(ParseError::MalformedUnicodeEscape { line })?;
		value = (value << 4) | nibble as u16;
	}
	Ok(value)
}

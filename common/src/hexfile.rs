use std::io::{BufRead, BufReader, Read, Write};

use crate::{RomError, ROM_SIZE};

const TOKENS_PER_LINE: usize = 16;

#[derive(Debug, PartialEq, Eq)]
pub enum HexFileLine {
    Data(Vec<HexFileData>),
    Comment(String),
}

#[derive(Debug, PartialEq, Eq)]
pub enum HexFileData {
    Byte(u8),
    Run(u32, u8),
}

/// Logisim "v2.0 raw" memory image, with `N*xx` run-length tokens.
#[derive(Debug, PartialEq, Eq)]
pub struct HexFile {
    pub lines: Vec<HexFileLine>,
}

impl HexFile {
    pub const fn header() -> &'static str {
        "v2.0 raw"
    }

    pub fn from_bytes(bytes: &[u8]) -> HexFile {
        let mut tokens = Vec::new();
        let mut i = 0;
        while i < bytes.len() {
            let b = bytes[i];
            let run = bytes[i..].iter().take_while(|x| **x == b).count();
            tokens.push(if run > 1 {
                HexFileData::Run(run as u32, b)
            } else {
                HexFileData::Byte(b)
            });
            i += run;
        }

        let mut lines = Vec::new();
        let mut tokens = tokens.into_iter().peekable();
        while tokens.peek().is_some() {
            lines.push(HexFileLine::Data(tokens.by_ref().take(TOKENS_PER_LINE).collect()));
        }

        HexFile { lines }
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        for line in &self.lines {
            match line {
                HexFileLine::Comment(_) => {}
                HexFileLine::Data(data) => {
                    for data in data {
                        match data {
                            HexFileData::Byte(b) => bytes.push(*b),
                            HexFileData::Run(count, b) => {
                                bytes.extend(std::iter::repeat(*b).take(*count as usize));
                            }
                        }
                    }
                }
            }
        }

        bytes
    }

    pub fn write<W: Write>(&self, out: &mut W) -> Result<(), RomError> {
        writeln!(out, "{}", HexFile::header())?;
        for line in &self.lines {
            match line {
                HexFileLine::Comment(c) => writeln!(out, "#{}", c)?,
                HexFileLine::Data(data) => {
                    let tokens: Vec<String> = data
                        .iter()
                        .map(|d| match d {
                            HexFileData::Byte(b) => format!("{:02x}", b),
                            HexFileData::Run(count, b) => format!("{}*{:02x}", count, b),
                        })
                        .collect();
                    writeln!(out, "{}", tokens.join(" "))?;
                }
            }
        }
        Ok(())
    }

    pub fn read<R: Read>(r: R) -> Result<HexFile, RomError> {
        let file = BufReader::new(r);
        let mut lines = file.lines();

        let header = lines.next().transpose()?.unwrap_or_default();
        if header.trim() != HexFile::header() {
            return Err(RomError::BadHexHeader {
                expected: HexFile::header(),
                found: header,
            });
        }

        let mut parsed = Vec::new();
        let mut total = 0usize;

        for (line_number, line) in lines.enumerate() {
            let line = line?;
            let line = line.trim();

            if let Some(comment) = line.strip_prefix('#') {
                parsed.push(HexFileLine::Comment(comment.to_string()));
                continue;
            }

            // header is line 1
            let line_number = line_number + 2;
            let bad = |token: &str| RomError::BadHexToken {
                line: line_number,
                token: token.to_string(),
            };

            let mut data = Vec::new();

            for block in line.split_whitespace() {
                let token = match block.split_once('*') {
                    Some((count, value)) => HexFileData::Run(
                        count.parse().map_err(|_| bad(block))?,
                        u8::from_str_radix(value, 16).map_err(|_| bad(block))?,
                    ),
                    None => HexFileData::Byte(u8::from_str_radix(block, 16).map_err(|_| bad(block))?),
                };

                // no image is larger than one chip
                total = total.saturating_add(match token {
                    HexFileData::Byte(_) => 1,
                    HexFileData::Run(count, _) => count as usize,
                });
                if total > ROM_SIZE {
                    return Err(bad(block));
                }

                data.push(token);
            }

            parsed.push(HexFileLine::Data(data));
        }

        Ok(HexFile { lines: parsed })
    }
}

//! Static glyph widths for the two PDF base-14 faces the resume renderer uses.
//!
//! Widths come from the Adobe Helvetica and Helvetica-Bold AFM files, in
//! thousandths of an em. Tables cover ASCII 0x20..=0x7E; index = (char as usize) - 32.
//! Text is passed through `pdf_safe` first, so nothing outside the table reaches
//! the measuring code except as the average-width fallback.

/// Font faces available to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Regular,
    Bold,
}

struct WidthTable {
    widths: [u16; 95],
    average: u16,
}

#[rustfmt::skip]
static HELVETICA: WidthTable = WidthTable {
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A-M
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        // N-Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a-m
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        // n-z
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {    |    }    ~
        334, 260, 334, 584,
    ],
    average: 540,
};

#[rustfmt::skip]
static HELVETICA_BOLD: WidthTable = WidthTable {
    widths: [
        // sp   !    "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :    ;    <    =    >    ?    @
        333, 333, 584, 584, 584, 611, 975,
        // A-M
        722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
        // N-Z
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [    \    ]    ^    _    `
        333, 278, 333, 584, 556, 333,
        // a-m
        556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
        // n-z
        611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
        // {    |    }    ~
        389, 280, 389, 584,
    ],
    average: 580,
};

fn table(face: Face) -> &'static WidthTable {
    match face {
        Face::Regular => &HELVETICA,
        Face::Bold => &HELVETICA_BOLD,
    }
}

/// Rendered width of `text` in points.
pub fn measure(text: &str, face: Face, size_pt: f32) -> f32 {
    let table = table(face);
    let units: u32 = text
        .chars()
        .map(|c| {
            let code = c as usize;
            if (32..=126).contains(&code) {
                u32::from(table.widths[code - 32])
            } else {
                u32::from(table.average)
            }
        })
        .sum();
    units as f32 * size_pt / 1000.0
}

/// Greedy word wrap to `max_width_pt`. Words wider than a full line are split by character.
pub fn wrap(text: &str, face: Face, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate, face, size_pt) <= max_width_pt {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if measure(word, face, size_pt) <= max_width_pt {
            current = word.to_string();
        } else {
            for piece in split_long_word(word, face, size_pt, max_width_pt) {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current = piece;
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_long_word(word: &str, face: Face, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    for c in word.chars() {
        piece.push(c);
        if measure(&piece, face, size_pt) > max_width_pt && piece.chars().count() > 1 {
            piece.pop();
            pieces.push(std::mem::take(&mut piece));
            piece.push(c);
        }
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Maps text onto printable ASCII, which is all the built-in fonts encode reliably.
pub fn pdf_safe(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            ' '..='~' => Some(c),
            '\t' | '\n' | '\r' => Some(' '),
            '\u{2018}' | '\u{2019}' | '\u{201B}' => Some('\''),
            '\u{201C}' | '\u{201D}' => Some('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => Some('-'),
            '\u{2022}' | '\u{00B7}' | '\u{25CF}' => Some('*'),
            '\u{00A0}' => Some(' '),
            c if c.is_control() => None,
            c => deaccent(c).or(Some('?')),
        })
        .collect()
}

fn deaccent(c: char) -> Option<char> {
    let base = match c {
        'à'..='å' => 'a',
        'À'..='Å' => 'A',
        'è'..='ë' => 'e',
        'È'..='Ë' => 'E',
        'ì'..='ï' => 'i',
        'Ì'..='Ï' => 'I',
        'ò'..='ö' | 'ø' => 'o',
        'Ò'..='Ö' | 'Ø' => 'O',
        'ù'..='ü' => 'u',
        'Ù'..='Ü' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        _ => return None,
    };
    Some(base)
}

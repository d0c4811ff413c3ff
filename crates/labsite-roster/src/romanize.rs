//! Chinese name romanization.
//!
//! Names are written surname first in Chinese and romanized as
//! "Given Surname" for the English site.

use pinyin::ToPinyin;

/// Two-character surnames and their surname readings.
///
/// Checked before the single-character default so that 欧阳娜娜 splits as
/// 欧阳 + 娜娜 rather than 欧 + 阳娜娜.
pub const DOUBLE_SURNAMES: &[(&str, &str)] = &[
    ("欧阳", "ouyang"),
    ("司马", "sima"),
    ("上官", "shangguan"),
    ("夏侯", "xiahou"),
    ("诸葛", "zhuge"),
    ("东方", "dongfang"),
    ("皇甫", "huangfu"),
    ("尉迟", "yuchi"),
    ("公羊", "gongyang"),
    ("赫连", "helian"),
    ("澹台", "tantai"),
    ("公冶", "gongye"),
    ("宗政", "zongzheng"),
    ("濮阳", "puyang"),
    ("淳于", "chunyu"),
    ("单于", "chanyu"),
    ("太叔", "taishu"),
    ("申屠", "shentu"),
    ("公孙", "gongsun"),
    ("仲孙", "zhongsun"),
    ("轩辕", "xuanyuan"),
    ("令狐", "linghu"),
    ("钟离", "zhongli"),
    ("宇文", "yuwen"),
    ("长孙", "zhangsun"),
    ("慕容", "murong"),
    ("鲜于", "xianyu"),
    ("闾丘", "lvqiu"),
    ("司徒", "situ"),
    ("司空", "sikong"),
    ("亓官", "qiguan"),
    ("司寇", "sikou"),
    ("子车", "ziju"),
    ("颛孙", "zhuansun"),
    ("司城", "sicheng"),
    ("南宫", "nangong"),
];

/// Single-character surnames read differently from the character's common
/// reading.
const SURNAME_READINGS: &[(char, &str)] = &[
    ('单', "shan"),
    ('曾', "zeng"),
    ('解', "xie"),
    ('仇', "qiu"),
    ('朴', "piao"),
    ('区', "ou"),
    ('查', "zha"),
    ('盖', "ge"),
    ('乐', "yue"),
    ('缪', "miao"),
    ('覃', "qin"),
    ('翟', "zhai"),
    ('万', "wan"),
    ('尉', "yu"),
    ('那', "na"),
    ('重', "chong"),
    ('种', "chong"),
    ('繁', "po"),
    ('过', "guo"),
    ('黑', "he"),
];

/// Split a Chinese name into surname and given name.
pub fn split_name(name: &str) -> (&str, &str) {
    let name = name.trim();

    if let Some((surname, _)) = DOUBLE_SURNAMES.iter().find(|(s, _)| name.starts_with(s)) {
        return name.split_at(surname.len());
    }

    match name.char_indices().nth(1) {
        Some((idx, _)) => name.split_at(idx),
        None => (name, ""),
    }
}

/// Toneless pinyin of every Han character, concatenated. Other characters are
/// kept as written.
pub fn to_pinyin(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_pinyin() {
            Some(p) => p.plain().to_string(),
            None => c.to_string(),
        })
        .collect()
}

/// Romanize a Chinese name as "Given Surname".
///
/// Names without Han characters are returned trimmed and otherwise unchanged.
pub fn romanize(name: &str) -> String {
    let name = name.trim();
    if !has_han(name) {
        return name.to_string();
    }

    let (surname, given) = split_name(name);
    let surname = capitalize(&surname_pinyin(surname));
    let given = capitalize(&to_pinyin(given));

    if given.is_empty() {
        surname
    } else {
        format!("{} {}", given, surname)
    }
}

/// URL-safe slug: lower-case pinyin of the whole name.
pub fn slugify(name: &str) -> String {
    let name = name.trim();
    let (surname, given) = split_name(name);
    let pinyin = if has_han(name) {
        format!("{}{}", surname_pinyin(surname), to_pinyin(given))
    } else {
        name.to_string()
    };

    let slug = pinyin
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "member".to_string()
    } else {
        slug
    }
}

fn surname_pinyin(surname: &str) -> String {
    if let Some((_, reading)) = DOUBLE_SURNAMES.iter().find(|(s, _)| *s == surname) {
        return reading.to_string();
    }

    let mut chars = surname.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => SURNAME_READINGS
            .iter()
            .find(|(s, _)| *s == c)
            .map(|(_, reading)| reading.to_string())
            .unwrap_or_else(|| to_pinyin(surname)),
        _ => to_pinyin(surname),
    }
}

fn has_han(text: &str) -> bool {
    text.chars().any(|c| c.to_pinyin().is_some())
}

/// Upper-case the first letter, lower-case the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

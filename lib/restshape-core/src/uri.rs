use std::sync::LazyLock;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};
use url::Url;

use crate::args::ArgValue;
use crate::error::SerializeError;

/// Regular expression for template expressions: an optional operator then a
/// comma separated list of variables, e.g. `{Bucket}`, `{+path}`, `{?a,b}`.
static RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(?<operator>[+#./;?&])?(?<variables>[^{}]+)}").expect("a valid regex")
});

/// Percent-encoded triplets kept as-is by the reserved operators.
static PCT_ENCODED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[0-9A-Fa-f]{2}").expect("a valid regex"));

/// Everything but RFC 3986 unreserved characters.
const SIMPLE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Greedy labels (`{Key+}`) keep path separators only.
const GREEDY: &AsciiSet = &SIMPLE.remove(b'/');

/// Reserved expansion also keeps RFC 3986 reserved characters.
const RESERVED: &AsciiSet = &SIMPLE
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// The value of a template variable.
///
/// Empty lists and maps are undefined and expand like a missing variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateValue {
    /// A single string.
    Scalar(String),
    /// Items joined with `,`, or with the operator separator when exploded.
    List(Vec<String>),
    /// Key/value pairs, in order.
    Map(Vec<(String, String)>),
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for TemplateValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl TryFrom<&ArgValue> for TemplateValue {
    type Error = SerializeError;

    /// Lists and maps keep their structure, their items use the wire string.
    fn try_from(value: &ArgValue) -> Result<Self, Self::Error> {
        let result = match value {
            ArgValue::List(items) => Self::List(
                items
                    .iter()
                    .map(ArgValue::to_wire_string)
                    .collect::<Result<_, _>>()?,
            ),
            ArgValue::Map(entries) => Self::Map(
                entries
                    .iter()
                    .map(|(key, item)| Ok((key.clone(), item.to_wire_string()?)))
                    .collect::<Result<_, SerializeError>>()?,
            ),
            other => Self::Scalar(other.to_wire_string()?),
        };
        Ok(result)
    }
}

/// Expansion rules of an RFC 6570 operator.
#[derive(Debug, Clone, Copy)]
struct Operator {
    first: &'static str,
    separator: &'static str,
    named: bool,
    if_empty: &'static str,
    reserved: bool,
}

impl Operator {
    fn parse(operator: Option<&str>) -> Self {
        let (first, separator, named, if_empty, reserved) = match operator {
            Some("+") => ("", ",", false, "", true),
            Some("#") => ("#", ",", false, "", true),
            Some(".") => (".", ".", false, "", false),
            Some("/") => ("/", "/", false, "", false),
            Some(";") => (";", ";", true, "", false),
            Some("?") => ("?", "&", true, "=", false),
            Some("&") => ("&", "&", true, "=", false),
            _ => ("", ",", false, "", false),
        };
        Self {
            first,
            separator,
            named,
            if_empty,
            reserved,
        }
    }
}

/// A variable of an expression with its modifiers.
#[derive(Debug, Clone, Copy)]
struct VarSpec<'a> {
    name: &'a str,
    explode: bool,
    greedy: bool,
    prefix: Option<usize>,
}

impl<'a> VarSpec<'a> {
    fn parse(spec: &'a str) -> Self {
        let spec = spec.trim();
        if let Some(name) = spec.strip_suffix('*') {
            return Self::named(name).exploded();
        }
        if let Some(name) = spec.strip_suffix('+') {
            return Self {
                greedy: true,
                ..Self::named(name)
            };
        }
        if let Some((name, length)) = spec.split_once(':')
            && let Ok(length) = length.parse()
        {
            return Self {
                prefix: Some(length),
                ..Self::named(name)
            };
        }
        Self::named(spec)
    }

    fn named(name: &'a str) -> Self {
        Self {
            name,
            explode: false,
            greedy: false,
            prefix: None,
        }
    }

    fn exploded(self) -> Self {
        Self {
            explode: true,
            ..self
        }
    }
}

/// An unexpanded request target: base endpoint, path template and the values
/// of its variables.
///
/// A `None` variable is defined by the input shape but has no argument; it
/// expands to nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointTemplate {
    base: Url,
    template: String,
    variables: IndexMap<String, Option<TemplateValue>>,
}

impl EndpointTemplate {
    /// Creates a template without variables.
    pub fn new(base: Url, template: impl Into<String>) -> Self {
        Self {
            base,
            template: template.into(),
            variables: IndexMap::new(),
        }
    }

    /// Sets (or replaces) a variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: Option<TemplateValue>) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// The base endpoint.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The unexpanded path template.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// The substitution map.
    pub fn variables(&self) -> &IndexMap<String, Option<TemplateValue>> {
        &self.variables
    }

    /// Expands the path template only.
    ///
    /// Expressions follow RFC 6570 up to level 4: the `+ # . / ; ? &`
    /// operators, the `*` explode and `:n` prefix modifiers. `{name}`
    /// percent-encodes every character outside the unreserved set, `{+name}`
    /// keeps reserved characters. The `{name+}` greedy label encodes
    /// everything but `/`.
    /// Undefined and `None` variables expand to the empty string.
    pub fn expand_path(&self) -> String {
        RE.replace_all(&self.template, |caps: &Captures<'_>| {
            let operator = Operator::parse(caps.name("operator").map(|op| op.as_str()));
            let Some(variables) = caps.name("variables") else {
                return String::new();
            };

            let parts = variables
                .as_str()
                .split(',')
                .map(VarSpec::parse)
                .filter_map(|spec| self.expand_variable(operator, spec))
                .collect::<Vec<_>>();
            if parts.is_empty() {
                String::new()
            } else {
                format!("{}{}", operator.first, parts.join(operator.separator))
            }
        })
        .into_owned()
    }

    fn expand_variable(&self, operator: Operator, spec: VarSpec<'_>) -> Option<String> {
        let value = self.variables.get(spec.name)?.as_ref()?;
        let escape = |text: &str| encode(text, operator, spec.greedy);
        let named = |text: &str, key: &str| {
            if text.is_empty() {
                format!("{key}{}", operator.if_empty)
            } else {
                format!("{key}={}", escape(text))
            }
        };

        let expanded = match value {
            TemplateValue::Scalar(text) => {
                let text = match spec.prefix {
                    Some(length) => text.chars().take(length).collect(),
                    None => text.clone(),
                };
                if operator.named {
                    named(&text, spec.name)
                } else {
                    escape(&text)
                }
            }
            TemplateValue::List(items) if items.is_empty() => return None,
            TemplateValue::List(items) if spec.explode => {
                let items = items.iter().map(|item| {
                    if operator.named {
                        named(item, spec.name)
                    } else {
                        escape(item)
                    }
                });
                items.collect::<Vec<_>>().join(operator.separator)
            }
            TemplateValue::List(items) => {
                let joined = items.iter().map(|item| escape(item)).collect::<Vec<_>>();
                with_name(operator, spec.name, &joined.join(","))
            }
            TemplateValue::Map(entries) if entries.is_empty() => return None,
            TemplateValue::Map(entries) if spec.explode => {
                let entries = entries.iter().map(|(key, item)| {
                    if operator.named {
                        named(item, &escape(key))
                    } else {
                        format!("{}={}", escape(key), escape(item))
                    }
                });
                entries.collect::<Vec<_>>().join(operator.separator)
            }
            TemplateValue::Map(entries) => {
                let joined = entries
                    .iter()
                    .flat_map(|(key, item)| [escape(key), escape(item)])
                    .collect::<Vec<_>>();
                with_name(operator, spec.name, &joined.join(","))
            }
        };
        Some(expanded)
    }

    /// Expands the template and joins it to the base endpoint.
    ///
    /// The expanded path is appended to the base path; the query and fragment
    /// parts of the expansion are kept as the URL query and fragment.
    ///
    /// # Errors
    ///
    /// Fails when the result is not a valid URL.
    pub fn expand(&self) -> Result<Url, SerializeError> {
        let expanded = self.expand_path();
        let (expanded, fragment) = match expanded.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment)),
            None => (expanded.as_str(), None),
        };
        let (path, query) = match expanded.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (expanded, None),
        };

        let url = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let mut url = url.parse::<Url>()?;
        url.set_query(query.filter(|query| !query.is_empty()));
        url.set_fragment(fragment.filter(|fragment| !fragment.is_empty()));

        Ok(url)
    }
}

/// Prefixes an unexploded composite value with `name=` for named operators.
fn with_name(operator: Operator, name: &str, joined: &str) -> String {
    if operator.named {
        format!("{name}={joined}")
    } else {
        joined.to_string()
    }
}

fn encode(text: &str, operator: Operator, greedy: bool) -> String {
    if greedy {
        return utf8_percent_encode(text, GREEDY).to_string();
    }
    if !operator.reserved {
        return utf8_percent_encode(text, SIMPLE).to_string();
    }

    let mut result = String::with_capacity(text.len());
    let mut last = 0;
    for triplet in PCT_ENCODED.find_iter(text) {
        let literal = text.get(last..triplet.start()).unwrap_or_default();
        result.extend(utf8_percent_encode(literal, RESERVED));
        result.push_str(triplet.as_str());
        last = triplet.end();
    }
    result.extend(utf8_percent_encode(
        text.get(last..).unwrap_or_default(),
        RESERVED,
    ));
    result
}

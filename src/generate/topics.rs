use serde::Serialize;
use std::collections::HashSet;

/// Gradient colors assigned to a topic badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TopicColors {
    pub gradient_from: &'static str,
    pub gradient_to: &'static str,
    pub hover_gradient_from: &'static str,
    pub hover_gradient_to: &'static str,
}

const fn colors(
    gradient_from: &'static str,
    gradient_to: &'static str,
    hover_gradient_from: &'static str,
    hover_gradient_to: &'static str,
) -> TopicColors {
    TopicColors {
        gradient_from,
        gradient_to,
        hover_gradient_from,
        hover_gradient_to,
    }
}

pub const TOPIC_PALETTE: [TopicColors; 24] = [
    colors("cyan-500", "blue-500", "cyan-400", "blue-400"),
    colors("orange-500", "red-500", "orange-400", "red-400"),
    colors("teal-500", "cyan-500", "teal-400", "cyan-400"),
    colors("emerald-500", "green-500", "emerald-400", "green-400"),
    colors("amber-500", "orange-500", "amber-400", "orange-400"),
    colors("sky-500", "blue-500", "sky-400", "blue-400"),
    colors("rose-500", "pink-500", "rose-400", "pink-400"),
    colors("green-500", "teal-500", "green-400", "teal-400"),
    colors("yellow-500", "amber-500", "yellow-400", "amber-400"),
    colors("lime-500", "green-500", "lime-400", "green-400"),
    colors("blue-500", "cyan-500", "blue-400", "cyan-400"),
    colors("red-500", "orange-500", "red-400", "orange-400"),
    colors("pink-500", "rose-500", "pink-400", "rose-400"),
    colors("teal-500", "emerald-500", "teal-400", "emerald-400"),
    colors("cyan-500", "sky-500", "cyan-400", "sky-400"),
    colors("fuchsia-500", "pink-500", "fuchsia-400", "pink-400"),
    colors("emerald-500", "teal-500", "emerald-400", "teal-400"),
    colors("amber-500", "yellow-500", "amber-400", "yellow-400"),
    colors("blue-500", "sky-500", "blue-400", "sky-400"),
    colors("red-500", "rose-500", "red-400", "rose-400"),
    colors("green-500", "emerald-500", "green-400", "emerald-400"),
    colors("fuchsia-500", "rose-500", "fuchsia-400", "rose-400"),
    colors("sky-500", "cyan-500", "sky-400", "cyan-400"),
    colors("lime-500", "yellow-500", "lime-400", "yellow-400"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTopic {
    pub name: String,
    #[serde(flatten)]
    pub colors: TopicColors,
}

/// Plans topics to create for `names`, skipping blanks, repeats and names in
/// `existing_names`. Colors continue round-robin from `existing_topic_count`.
pub fn assign_topic_colors<'a, I>(
    names: I,
    existing_names: &HashSet<String>,
    existing_topic_count: usize,
) -> Vec<NewTopic>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|name| !name.is_empty())
        .filter(|name| seen.insert(*name))
        .filter(|name| !existing_names.contains(*name))
        .enumerate()
        .map(|(offset, name)| NewTopic {
            name: name.to_owned(),
            colors: TOPIC_PALETTE[(existing_topic_count + offset) % TOPIC_PALETTE.len()],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{TOPIC_PALETTE, assign_topic_colors};
    use std::collections::HashSet;

    #[test]
    fn skips_blank_repeated_and_existing_names() {
        let existing: HashSet<String> = ["Rust".to_owned()].into_iter().collect();
        let topics = assign_topic_colors(["Rust", "", "Docker", "Docker", "Kafka"], &existing, 0);
        let names: Vec<&str> = topics.iter().map(|topic| topic.name.as_str()).collect();

        assert_eq!(names, vec!["Docker", "Kafka"]);
        assert_eq!(topics[0].colors, TOPIC_PALETTE[0]);
        assert_eq!(topics[1].colors, TOPIC_PALETTE[1]);
    }

    #[test]
    fn colors_wrap_around_palette() {
        let topics = assign_topic_colors(["Go", "Zig"], &HashSet::new(), 23);

        assert_eq!(topics[0].colors, TOPIC_PALETTE[23]);
        assert_eq!(topics[1].colors, TOPIC_PALETTE[0]);
        assert_eq!(topics[1].colors.gradient_from, "cyan-500");
    }
}

//! Splits a markdown report into fragments that fit in a single PR comment
//!
//! GitHub rejects comment bodies over 65,536 characters. Reports above the
//! configured limit are cut on line boundaries, each piece is repaired so it
//! renders on its own (no dangling code fence or `<details>` section), and the
//! pieces are labelled `Part i/N`.
//!
//! Every fragment stays within the limit, repair markup included. Markup that
//! a cut leaves open is reopened at the start of the next piece, up to a fixed
//! share of the budget; anything beyond that is only closed.
//!
//! Sizes are measured in UTF-8 bytes, which never undercounts characters.

use anyhow::{Result, bail};

/// Default comment size limit, leaving headroom below GitHub's ceiling
pub const DEFAULT_MAX_COMMENT_SIZE: usize = 60_000;

/// Hard limit GitHub enforces on a comment body
pub const GITHUB_COMMENT_LIMIT: usize = 65_536;

/// Smallest limit accepted by [`CommentSplitter`]
pub const MIN_COMMENT_SIZE: usize = 1_024;

const FENCE: &str = "```";
const DETAILS_OPEN: &str = "<details";
const DETAILS_CLOSE: &str = "</details>";
const STRAY_OPENER: &str = "<details>\n";
const REOPENED_DETAILS: &str = "<details open>\n";
const CONTINUED_OPEN: &str = "<details>\n<summary><b>Continued...</b></summary>\n\n";
const CONTINUED_CLOSE: &str = "\n</details>";

// Fits "**Part i/N**\n\n" with up to ten digits on each side
const PART_HEADER_RESERVE: usize = 32;

// Longer opening fence lines are re-opened as a bare fence
const MAX_REOPENED_FENCE: usize = 32;

// Share of the budget (1/N) that markup carried into a chunk may take
const CARRY_SHARE: usize = 4;

/// Delimiter counts of a piece of markdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Markup {
    opens: usize,
    closes: usize,
    fences: usize,
}

impl Markup {
    fn of(text: &str) -> Self {
        Self {
            opens: text.matches(DETAILS_OPEN).count(),
            closes: text.matches(DETAILS_CLOSE).count(),
            fences: text.matches(FENCE).count(),
        }
    }

    fn add(self, other: Self) -> Self {
        Self {
            opens: self.opens + other.opens,
            closes: self.closes + other.closes,
            fences: self.fences + other.fences,
        }
    }

    /// Bytes [`repair_boundary`] adds to text with these counts
    fn repair_cost(&self) -> usize {
        let fence = if self.fences % 2 == 1 { 1 + FENCE.len() } else { 0 };

        self.closes.saturating_sub(self.opens) * STRAY_OPENER.len()
            + fence
            + self.opens.saturating_sub(self.closes) * (1 + DETAILS_CLOSE.len())
    }
}

/// One planned fragment: `body[start..end]` behind `reopen`, repaired into `text`
#[derive(Debug, Clone, PartialEq, Eq)]
struct Chunk {
    start: usize,
    end: usize,
    reopen: String,
    text: String,
}

/// Splits report bodies into comment-sized fragments
#[derive(Debug, Clone)]
pub struct CommentSplitter {
    max_size: usize,
}

impl Default for CommentSplitter {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_COMMENT_SIZE,
        }
    }
}

impl CommentSplitter {
    /// Create a splitter for the given size limit
    pub fn new(max_size: usize) -> Result<Self> {
        if max_size < MIN_COMMENT_SIZE {
            bail!(
                "Maximum comment size must be at least {} (got {})",
                MIN_COMMENT_SIZE,
                max_size
            );
        }

        if max_size > GITHUB_COMMENT_LIMIT {
            bail!(
                "Maximum comment size {} exceeds GitHub's limit of {}",
                max_size,
                GITHUB_COMMENT_LIMIT
            );
        }

        Ok(Self { max_size })
    }

    /// Split `body` into fragments no longer than the size limit.
    ///
    /// A body within the limit is returned untouched as the only fragment.
    pub fn split(&self, body: &str) -> Vec<String> {
        if body.len() <= self.max_size {
            return vec![body.to_string()];
        }

        let chunks = self.chunks(body);
        let total = chunks.len();

        chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| decorate(i + 1, total, &chunk.text))
            .collect()
    }

    /// Room left for chunk content once part markers and wrappers are added
    fn budget(&self) -> usize {
        self.max_size - PART_HEADER_RESERVE - CONTINUED_OPEN.len() - CONTINUED_CLOSE.len()
    }

    /// How many `<details>` sections may be reopened in one chunk
    fn max_reopened_details(&self) -> usize {
        let fence = MAX_REOPENED_FENCE + 1 + 1 + FENCE.len();
        let per_section = REOPENED_DETAILS.len() + 1 + DETAILS_CLOSE.len();

        (self.budget() / CARRY_SHARE).saturating_sub(fence) / per_section
    }

    /// Cut `body` into balanced chunks within the budget.
    ///
    /// Whole lines are taken while the repaired chunk still fits. A chunk that
    /// would otherwise hold no text is cut inside its first line.
    fn chunks(&self, body: &str) -> Vec<Chunk> {
        let budget = self.budget();
        let max_reopened = self.max_reopened_details();
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut reopen = String::new();

        while start < body.len() {
            let rest = &body[start..];
            let lead = Markup::of(&reopen);
            let mut markup = lead;
            let mut end = 0;
            let mut next = 0;

            for line in rest.split_inclusive('\n') {
                let content = line.strip_suffix('\n').unwrap_or(line);
                let with_line = markup.add(Markup::of(content));

                if reopen.len() + next + content.len() + with_line.repair_cost() > budget {
                    break;
                }

                markup = with_line;
                end = next + content.len();
                next += line.len();
            }

            if end == 0 {
                end = hard_cut(rest, lead, reopen.len(), budget);
                next = end;
            }

            let candidate = format!("{}{}", reopen, &rest[..end]);
            let carried = reopen_markup(&candidate, max_reopened);

            chunks.push(Chunk {
                start,
                end: start + end,
                reopen,
                text: repair_boundary(&candidate),
            });

            reopen = carried;
            start += next;
        }

        chunks
    }
}

/// Length of the longest prefix of `text` whose repaired chunk fits `budget`.
///
/// `fixed` bytes of reopened markup (with counts `lead`) precede the prefix.
/// Cuts on a character boundary and always takes at least one character.
fn hard_cut(text: &str, lead: Markup, fixed: usize, budget: usize) -> usize {
    let first = text.chars().next().map_or(text.len(), char::len_utf8);
    let room = budget.saturating_sub(fixed + lead.repair_cost());
    let mut len = char_floor(text, room.min(text.len())).max(first);

    loop {
        let cost = fixed + len + lead.add(Markup::of(&text[..len])).repair_cost();
        if cost <= budget || len == first {
            return len;
        }

        len = char_floor(text, len - (cost - budget).min(len)).max(first);
    }
}

fn char_floor(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Close whatever markup `chunk` leaves open so it renders on its own.
///
/// Counts delimiters only: an odd number of code fences gets a closing fence,
/// unmatched `<details` openers get closing tags, and stray `</details>`
/// closers get openers prepended. Nesting is not parsed.
pub fn repair_boundary(chunk: &str) -> String {
    let markup = Markup::of(chunk);
    let mut repaired = String::with_capacity(chunk.len() + markup.repair_cost());

    for _ in markup.opens..markup.closes {
        repaired.push_str(STRAY_OPENER);
    }

    repaired.push_str(chunk);

    if markup.fences % 2 == 1 {
        repaired.push('\n');
        repaired.push_str(FENCE);
    }

    for _ in markup.closes..markup.opens {
        repaired.push('\n');
        repaired.push_str(DETAILS_CLOSE);
    }

    repaired
}

/// Markup the next chunk starts with to continue what `chunk` left open.
///
/// At most `max_details` sections are reopened; the rest stay closed.
fn reopen_markup(chunk: &str, max_details: usize) -> String {
    let markup = Markup::of(chunk);
    let mut reopen = String::new();

    for _ in 0..markup.opens.saturating_sub(markup.closes).min(max_details) {
        reopen.push_str(REOPENED_DETAILS);
    }

    if markup.fences % 2 == 1 {
        reopen.push_str(opening_fence(chunk));
        reopen.push('\n');
    }

    reopen
}

/// The line of the last fence in `chunk`, e.g. "```diff".
///
/// Falls back to a bare fence when that line is long or carries other markup.
fn opening_fence(chunk: &str) -> &str {
    let bare = Markup {
        fences: 1,
        ..Markup::default()
    };

    chunk
        .rfind(FENCE)
        .and_then(|start| chunk[start..].lines().next())
        .map(str::trim_end)
        .filter(|line| line.len() <= MAX_REOPENED_FENCE && Markup::of(line) == bare)
        .unwrap_or(FENCE)
}

/// Add the part indicator, wrapping continuation parts in a collapsed section
fn decorate(part: usize, total: usize, chunk: &str) -> String {
    if part == 1 {
        format!("**Part {}/{}**\n\n{}", part, total, chunk)
    } else {
        format!(
            "**Part {}/{}**\n\n{}{}{}",
            part, total, CONTINUED_OPEN, chunk, CONTINUED_CLOSE
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ChangeBucket, classify};
    use crate::report::composer::{ReportComposer, ReportOptions};
    use crate::test_helpers::PlanFixture;
    use crate::traits::{MockFileSystem, MockOutput};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn splitter() -> CommentSplitter {
        CommentSplitter::new(MIN_COMMENT_SIZE).unwrap()
    }

    /// Remove the part indicator and continuation wrapper added by `split`
    fn strip_decoration(fragment: &str, index: usize) -> &str {
        let header_end = fragment.find("**\n\n").unwrap() + "**\n\n".len();
        let body = &fragment[header_end..];

        if index == 0 {
            body
        } else {
            body.strip_prefix(CONTINUED_OPEN)
                .and_then(|b| b.strip_suffix(CONTINUED_CLOSE))
                .unwrap()
        }
    }

    fn numbered_lines(count: usize) -> String {
        (0..count)
            .map(|i| format!("line {:04} of the plan report, padded out a bit", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn large_report(resources: usize) -> String {
        let mut fixture = PlanFixture::new();
        for i in 0..resources {
            fixture = fixture.resource(&format!("module.app.aws_instance.server_{:04}", i), &["create"]);
        }
        for i in 0..resources / 4 {
            fixture = fixture.resource(&format!("aws_db_instance.replica_{:04}", i), &["delete", "create"]);
        }

        let fs = MockFileSystem::new();
        let output = MockOutput::new();
        let options = ReportOptions::default();
        let composer = ReportComposer::new(&fs, &output, &options);

        let changes = fixture.changes();
        let bucket: ChangeBucket = classify(&changes);
        composer.render_plan(&bucket)
    }

    fn assert_balanced(fragment: &str) {
        assert_eq!(fragment.matches(FENCE).count() % 2, 0, "unbalanced fence:\n{}", fragment);
        assert_eq!(
            fragment.matches(DETAILS_OPEN).count(),
            fragment.matches(DETAILS_CLOSE).count(),
            "unbalanced details:\n{}",
            fragment
        );
    }

    /// Check that `fragments` rebuild `body`: each one is stray openers, the
    /// reopened markup, a slice of `body` and closing markup, and the slices
    /// cover `body` in order, dropping only the newlines at cuts
    fn assert_round_trip(body: &str, splitter: &CommentSplitter, fragments: &[String]) {
        let chunks = splitter.chunks(body);
        assert_eq!(chunks.len(), fragments.len());

        let mut rebuilt = String::new();

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(strip_decoration(&fragments[i], i), chunk.text);

            let reopened_fence = chunk.reopen.trim_start_matches(REOPENED_DETAILS);
            assert!(reopened_fence.is_empty() || reopened_fence.starts_with(FENCE));

            let inner = format!("{}{}", chunk.reopen, &body[chunk.start..chunk.end]);
            let markup = Markup::of(&inner);
            let strays = STRAY_OPENER.repeat(markup.closes.saturating_sub(markup.opens));
            let mut tail = chunk
                .text
                .strip_prefix(strays.as_str())
                .and_then(|t| t.strip_prefix(inner.as_str()))
                .expect("fragment does not contain its slice of the body");
            if markup.fences % 2 == 1 {
                tail = tail.strip_prefix("\n```").expect("missing closing fence");
            }
            assert_eq!(tail, "\n</details>".repeat(markup.opens.saturating_sub(markup.closes)));

            rebuilt.push_str(&body[chunk.start..chunk.end]);
            let next_start = chunks.get(i + 1).map_or(body.len(), |c| c.start);
            if next_start != chunk.end {
                assert_eq!(next_start, chunk.end + 1);
                assert_eq!(body.as_bytes()[chunk.end], b'\n');
                rebuilt.push('\n');
            }
        }

        assert_eq!(rebuilt, body);
    }

    fn generated_document(rng: &mut StdRng, limit: usize) -> String {
        let lines = rng.gen_range(20..400);

        (0..lines)
            .map(|i| match rng.gen_range(0..12) {
                0 => "<details>".to_string(),
                1 => "<details open>".to_string(),
                2 => "</details>".to_string(),
                3 => "```".to_string(),
                4 => "```diff".to_string(),
                5 => "<summary><b>Terraform Plan</b></summary>".to_string(),
                6 => String::new(),
                7 => "x".repeat(rng.gen_range(1..2 * limit)),
                8 => "é".repeat(rng.gen_range(1..limit)),
                9 => format!("header with ``` and <details> inline {}", i),
                10 => "</details></details>```".to_string(),
                _ => format!("+ module.app.aws_instance.server_{:04}", i),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_new_validates_limit() {
        assert!(CommentSplitter::new(MIN_COMMENT_SIZE - 1).is_err());
        assert!(CommentSplitter::new(GITHUB_COMMENT_LIMIT + 1).is_err());
        assert!(CommentSplitter::new(GITHUB_COMMENT_LIMIT).is_ok());
        assert_eq!(
            CommentSplitter::default().budget(),
            CommentSplitter::new(DEFAULT_MAX_COMMENT_SIZE).unwrap().budget()
        );
    }

    #[test]
    fn test_small_body_is_returned_unmodified() {
        let body = "\n<details>\n```diff\n+ aws_instance.a\n";
        let fragments = splitter().split(body);

        assert_eq!(fragments, vec![body.to_string()]);
    }

    #[test]
    fn test_body_at_exact_limit_is_single_fragment() {
        let body = "a".repeat(MIN_COMMENT_SIZE);
        let fragments = splitter().split(&body);

        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0], body);
    }

    #[test]
    fn test_large_body_gets_part_indicators() {
        let body = numbered_lines(100);
        let fragments = splitter().split(&body);
        let total = fragments.len();

        assert!(total > 1);
        for (i, fragment) in fragments.iter().enumerate() {
            assert!(fragment.starts_with(&format!("**Part {}/{}**\n\n", i + 1, total)));
            assert!(fragment.len() <= MIN_COMMENT_SIZE);
        }

        assert!(!fragments[0].contains("Continued..."));
        for fragment in &fragments[1..] {
            assert!(fragment.contains("<details>\n<summary><b>Continued...</b></summary>\n\n"));
            assert!(fragment.ends_with("\n</details>"));
        }
    }

    #[test]
    fn test_split_round_trips_on_line_boundaries() {
        let body = numbered_lines(250);
        let fragments = splitter().split(&body);

        let rebuilt = fragments
            .iter()
            .enumerate()
            .map(|(i, f)| strip_decoration(f, i))
            .collect::<Vec<_>>()
            .join("\n");

        assert_eq!(rebuilt, body);
    }

    #[test]
    fn test_lines_are_never_split() {
        let body = numbered_lines(120);
        let original: Vec<&str> = body.lines().collect();
        let fragments = splitter().split(&body);

        let mut seen = Vec::new();
        for (i, fragment) in fragments.iter().enumerate() {
            seen.extend(strip_decoration(fragment, i).lines());
        }

        assert_eq!(seen, original);
    }

    #[test]
    fn test_hard_split_without_newlines() {
        let body = "x".repeat(3 * MIN_COMMENT_SIZE);
        let fragments = splitter().split(&body);

        assert!(fragments.len() > 3);
        for fragment in &fragments {
            assert!(fragment.len() <= MIN_COMMENT_SIZE);
        }

        let rebuilt: String = fragments
            .iter()
            .enumerate()
            .map(|(i, f)| strip_decoration(f, i))
            .collect();
        assert_eq!(rebuilt, body);
    }

    #[test]
    fn test_hard_split_respects_char_boundaries() {
        let body = "é".repeat(MIN_COMMENT_SIZE);
        let fragments = splitter().split(&body);

        assert!(fragments.len() > 1);
        let rebuilt: String = fragments
            .iter()
            .enumerate()
            .map(|(i, f)| strip_decoration(f, i))
            .collect();
        assert_eq!(rebuilt, body);
    }

    #[test]
    fn test_blank_line_before_long_line_is_not_its_own_fragment() {
        let body = format!("\n{}", "y".repeat(2 * MIN_COMMENT_SIZE));
        let splitter = splitter();
        let fragments = splitter.split(&body);

        for (i, fragment) in fragments.iter().enumerate() {
            assert!(strip_decoration(fragment, i).contains('y'));
        }
        assert_round_trip(&body, &splitter, &fragments);
    }

    #[test]
    fn test_fragments_are_balanced() {
        let report = large_report(120);
        assert!(report.len() > 4 * MIN_COMMENT_SIZE);

        let splitter = splitter();
        let fragments = splitter.split(&report);

        assert!(fragments.len() > 4);
        for fragment in &fragments {
            assert!(fragment.len() <= MIN_COMMENT_SIZE, "fragment too long");
            assert_balanced(fragment);
        }
        assert_round_trip(&report, &splitter, &fragments);
    }

    #[test]
    fn test_continuation_reopens_diff_block() {
        let report = large_report(120);
        let fragments = splitter().split(&report);

        // The create list spans several parts; each continuation resumes inside
        // a diff block instead of rendering addresses as plain text
        let continued = fragments
            .iter()
            .skip(1)
            .filter(|f| f.contains("<details open>\n```diff\n+ module.app"))
            .count();
        assert!(continued > 0);
    }

    #[test]
    fn test_no_resource_line_lost_or_duplicated() {
        let report = large_report(120);
        let fragments = splitter().split(&report);

        let expected: Vec<&str> = report
            .lines()
            .filter(|l| l.starts_with("+ ") || l.starts_with("- "))
            .collect();
        let actual: Vec<&str> = fragments
            .iter()
            .flat_map(|f| f.lines())
            .filter(|l| l.starts_with("+ ") || l.starts_with("- "))
            .collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_deeply_nested_details_stay_within_limit() {
        for depth in [10, 40, 60, 120] {
            let body = format!("{}{}", "<details>\n".repeat(depth), "z\n".repeat(2000));
            let splitter = splitter();
            let fragments = splitter.split(&body);

            assert!(
                fragments.len() <= 12,
                "{} fragments for nesting depth {}",
                fragments.len(),
                depth
            );
            for fragment in &fragments {
                assert!(fragment.len() <= MIN_COMMENT_SIZE);
                assert_balanced(fragment);
            }
            assert_round_trip(&body, &splitter, &fragments);
        }
    }

    #[test]
    fn test_reopened_markup_is_capped() {
        let splitter = splitter();
        let max = splitter.max_reopened_details();
        let chunk = format!("{}```diff\n+ a", "<details>\n".repeat(max + 10));

        let reopen = reopen_markup(&chunk, max);

        assert_eq!(reopen.matches(REOPENED_DETAILS).count(), max);
        assert!(reopen.ends_with("```diff\n"));
        assert!(reopen.len() + Markup::of(&reopen).repair_cost() <= splitter.budget() / CARRY_SHARE);
    }

    #[test]
    fn test_generated_markup_documents() {
        for limit in [MIN_COMMENT_SIZE, 1_500, 4_096] {
            let splitter = CommentSplitter::new(limit).unwrap();

            for seed in 0..32u64 {
                let mut rng = StdRng::seed_from_u64(seed);
                let body = generated_document(&mut rng, limit);
                let fragments = splitter.split(&body);

                if body.len() <= limit {
                    assert_eq!(fragments, vec![body.clone()]);
                    continue;
                }

                assert!(
                    fragments.len() <= 12 * body.len() / limit + 4,
                    "seed {} limit {}: {} fragments for {} bytes",
                    seed,
                    limit,
                    fragments.len(),
                    body.len()
                );
                for fragment in &fragments {
                    assert!(fragment.len() <= limit, "seed {} limit {}: fragment too long", seed, limit);
                    assert_balanced(fragment);
                }
                assert_round_trip(&body, &splitter, &fragments);
            }
        }
    }

    #[test]
    fn test_repair_cost_matches_repair() {
        for chunk in [
            "",
            "```diff\n+ a",
            "</details>\n</details>\n<details>",
            "<details>\n<details open>\n```\n```\n```",
            "plain text",
        ] {
            assert_eq!(
                repair_boundary(chunk).len(),
                chunk.len() + Markup::of(chunk).repair_cost(),
                "{:?}",
                chunk
            );
        }
    }

    #[test]
    fn test_repair_boundary_closes_open_fence() {
        assert_eq!(
            repair_boundary("```diff\n+ aws_instance.a"),
            "```diff\n+ aws_instance.a\n```"
        );
    }

    #[test]
    fn test_repair_boundary_closes_open_details() {
        assert_eq!(
            repair_boundary("<details>\n<summary>x</summary>\n```diff\n+ a"),
            "<details>\n<summary>x</summary>\n```diff\n+ a\n```\n</details>"
        );
        assert_eq!(
            repair_boundary("<details open>\n<details>\nbody"),
            "<details open>\n<details>\nbody\n</details>\n</details>"
        );
    }

    #[test]
    fn test_repair_boundary_opens_stray_closer() {
        assert_eq!(
            repair_boundary("+ a\n</details>\nfooter"),
            "<details>\n+ a\n</details>\nfooter"
        );
    }

    #[test]
    fn test_repair_boundary_leaves_balanced_chunk_alone() {
        let chunk = "<details>\n```diff\n+ a\n```\n</details>";
        assert_eq!(repair_boundary(chunk), chunk);
        assert_eq!(repair_boundary(""), "");
    }

    #[test]
    fn test_reopen_markup() {
        assert_eq!(reopen_markup("<details>\n```diff\n+ a", 4), "<details open>\n```diff\n");
        assert_eq!(reopen_markup("```\n+ a", 4), "```\n");
        assert_eq!(reopen_markup("<details>\n```diff\n+ a\n```\n</details>", 4), "");
        assert_eq!(reopen_markup("<details>\n<details>\n+ a", 0), "");
        assert_eq!(reopen_markup("text ``` then <details> inline", 4), "<details open>\n```\n");
    }

    #[test]
    fn test_hard_cut() {
        let none = Markup::default();

        assert_eq!(hard_cut("abcdef", none, 0, 4), 4);
        assert_eq!(hard_cut("abc", none, 0, 10), 3);
        assert_eq!(hard_cut("ééé", none, 0, 3), 2);
        // A fence in the prefix needs room for its closing fence
        assert_eq!(hard_cut("```abcdef", none, 0, 8), 4);
        // Always takes at least one character
        assert_eq!(hard_cut("abc", none, 10, 4), 1);
    }
}

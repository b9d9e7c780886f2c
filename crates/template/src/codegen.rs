//! Coupon-code pool generation.
//!
//! Codes are 18 characters: a 4-char prefix (product-line digit + 3-digit
//! category code), a 6-char middle block (the template's creation date as
//! yyMMdd, shuffled), and an 8-char suffix (one non-zero digit + 7 random
//! digits). The suffix space (9 * 10^7) vastly exceeds realistic template
//! counts, so regenerating on collision terminates quickly.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;

use promo_core::{CouponError, CouponTemplate};
use promo_storage::{CodePool, TemplateStore};

/// Generates a template's code pool and flips the template available.
pub struct CodeGenerator {
    templates: Arc<dyn TemplateStore>,
    pool: Arc<dyn CodePool>,
}

impl CodeGenerator {
    pub fn new(templates: Arc<dyn TemplateStore>, pool: Arc<dyn CodePool>) -> Self {
        CodeGenerator { templates, pool }
    }

    /// Build the template's pool: exactly `count` distinct codes, pushed in
    /// one batch, then `available = true` persisted.
    ///
    /// Precondition: called exactly once per template. A second call for
    /// the same template id is a caller error and will push a second pool.
    pub async fn generate(&self, template: &CouponTemplate) -> Result<(), CouponError> {
        let started = Instant::now();

        let codes = build_codes(template);
        let count = codes.len();
        self.pool.push_codes(template.id, codes).await?;
        self.templates.mark_available(template.id).await?;

        tracing::info!(
            template_id = template.id,
            count,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "code pool generated, template is now available"
        );
        Ok(())
    }
}

/// Produce exactly `template.count` pairwise-distinct codes.
pub fn build_codes(template: &CouponTemplate) -> Vec<String> {
    let prefix = format!(
        "{}{}",
        template.product_line.code(),
        template.category.code()
    );
    let date_digits = creation_date_digits(template);

    let target = template.count as usize;
    let mut result = HashSet::with_capacity(target);
    let mut rng = rand::thread_rng();
    while result.len() < target {
        result.insert(format!(
            "{}{}{}",
            prefix,
            shuffled_mid6(&date_digits, &mut rng),
            suffix8(&mut rng)
        ));
    }
    result.into_iter().collect()
}

/// The creation date as six yyMMdd digit characters.
fn creation_date_digits(template: &CouponTemplate) -> Vec<char> {
    let date = template.create_time.date();
    format!(
        "{:02}{:02}{:02}",
        date.year().rem_euclid(100),
        u8::from(date.month()),
        date.day()
    )
    .chars()
    .collect()
}

fn shuffled_mid6(date_digits: &[char], rng: &mut impl Rng) -> String {
    let mut digits = date_digits.to_vec();
    digits.shuffle(rng);
    digits.into_iter().collect()
}

fn suffix8(rng: &mut impl Rng) -> String {
    let mut suffix = String::with_capacity(8);
    // Leading digit is never zero so the numeric suffix keeps its width.
    suffix.push(char::from(b'1' + rng.gen_range(0..9u8)));
    for _ in 0..7 {
        suffix.push(char::from(b'0' + rng.gen_range(0..10u8)));
    }
    suffix
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::{
        CouponCategory, Discount, DistributeTarget, Expiration, PeriodType, ProductLine,
        TemplateRule, Usage,
    };
    use time::macros::datetime;

    fn template(count: u32) -> CouponTemplate {
        let create_time = datetime!(2026-03-05 10:00 UTC);
        CouponTemplate {
            id: 3,
            available: false,
            expired: false,
            name: "gen".to_string(),
            logo: String::new(),
            intro: String::new(),
            category: CouponCategory::Percentage,
            product_line: ProductLine::Wholesale,
            count,
            create_time,
            user_id: 1,
            key: CouponTemplate::build_key(
                ProductLine::Wholesale,
                CouponCategory::Percentage,
                create_time,
            ),
            target: DistributeTarget::Multi,
            rule: TemplateRule {
                expiration: Expiration {
                    period: PeriodType::Regular,
                    gap: 1,
                    deadline: datetime!(2027-01-01 00:00 UTC),
                },
                discount: Discount { quota: 85, base: 1 },
                limitation: 1,
                usage: Usage {
                    province: "p".to_string(),
                    city: "c".to_string(),
                    goods_categories: vec![1],
                },
                weight: vec![],
            },
        }
    }

    fn sorted_digits(s: &str) -> Vec<char> {
        let mut chars: Vec<char> = s.chars().collect();
        chars.sort_unstable();
        chars
    }

    #[test]
    fn builds_exactly_count_distinct_codes() {
        let codes = build_codes(&template(500));
        assert_eq!(codes.len(), 500);
        let unique: HashSet<&String> = codes.iter().collect();
        assert_eq!(unique.len(), 500);
    }

    #[test]
    fn codes_match_the_4_6_8_format() {
        let codes = build_codes(&template(50));
        for code in &codes {
            assert_eq!(code.len(), 18, "code {code} is not 18 chars");
            // Prefix: wholesale product line + percentage category.
            assert!(code.starts_with("2002"), "bad prefix in {code}");
            // Middle block: a permutation of the yyMMdd digits 260305.
            assert_eq!(sorted_digits(&code[4..10]), sorted_digits("260305"));
            // Suffix: non-zero lead, all digits.
            let suffix = &code[10..18];
            assert!(suffix.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(&suffix[0..1], "0");
        }
    }

    #[tokio::test]
    async fn generate_pushes_pool_and_marks_available() {
        use promo_storage::{MemoryCodePool, MemoryStore};

        let store = Arc::new(MemoryStore::new());
        let pool = Arc::new(MemoryCodePool::new());
        let mut t = template(25);
        t.id = 0;
        let stored = store.insert_template(t).await.unwrap();

        let generator = CodeGenerator::new(store.clone() as Arc<dyn TemplateStore>, pool.clone());
        generator.generate(&stored).await.unwrap();

        assert_eq!(pool.pool_size(stored.id).await.unwrap(), 25);
        let reloaded = store.find_template(stored.id).await.unwrap();
        assert!(reloaded.available);
    }
}

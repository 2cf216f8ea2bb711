use std::collections::HashMap;

use serde_json::Value;
use sqlx::{Pool, Postgres};

use crate::{
    constants::{
        AMOUNT_LIMIT, AMOUNT_MIN, COOKING_TIME_DEFAULT, RECIPE_NAME_MAX_LEN, RECIPE_NAME_MIN_LEN,
        RECIPE_TEXT_MAX_LEN,
    },
    error::{ApiError, ValidationError},
    form::Form,
    schema::{Ingredient, Tag, Uuid},
};

use super::actions::{ingredients, tags};

/// Resolves submitted tag ids against the catalog in one batch lookup.
/// Fails when any id does not exist: the lookup collapses duplicates, so
/// a cardinality mismatch means an unknown (or repeated) identifier.
pub async fn validate_tags(tag_ids: &[Uuid], pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    if tag_ids.is_empty() {
        return Err(ValidationError::MissingTags.into());
    }

    let resolved = tags::list_tags_by_ids(tag_ids, pool).await?;
    check_tags(tag_ids, resolved).map_err(ApiError::from)
}

pub fn check_tags(requested: &[Uuid], resolved: Vec<Tag>) -> Result<Vec<Tag>, ValidationError> {
    if requested.is_empty() {
        return Err(ValidationError::MissingTags);
    }
    if resolved.len() != requested.len() {
        return Err(ValidationError::UnknownTag);
    }
    Ok(resolved)
}

/// Parses and range-checks submitted `{id, amount}` entries, then resolves
/// the referenced ingredients with a single catalog query. The result maps
/// ingredient id to its catalog row and final amount, ready for bulk
/// insertion.
pub async fn validate_ingredients(
    entries: &[Value],
    pool: &Pool<Postgres>,
) -> Result<HashMap<Uuid, (Ingredient, i32)>, ApiError> {
    let amounts = parse_ingredient_entries(entries)?;

    let ids: Vec<Uuid> = amounts.keys().copied().collect();
    let catalog = ingredients::list_ingredients_by_ids(&ids, pool).await?;

    match_catalog(amounts, catalog).map_err(ApiError::from)
}

/// Shape-checks entries without touching the catalog. Amounts must be
/// unsigned integers, given either as numbers or digit strings, within
/// [AMOUNT_MIN, AMOUNT_LIMIT). Entries repeating an ingredient id collapse
/// to the later entry's amount, never a sum.
pub fn parse_ingredient_entries(entries: &[Value]) -> Result<HashMap<Uuid, i64>, ValidationError> {
    if entries.is_empty() {
        return Err(ValidationError::MissingIngredients);
    }

    let mut amounts: HashMap<Uuid, i64> = HashMap::new();

    for entry in entries {
        let id = entry
            .get("id")
            .and_then(Value::as_i64)
            .and_then(|id| Uuid::try_from(id).ok())
            .ok_or(ValidationError::BadAmountFormat)?;

        let amount = match entry.get("amount") {
            Some(Value::Number(n)) => n.as_i64().ok_or(ValidationError::BadAmountFormat)?,
            Some(Value::String(s)) => {
                if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
                    return Err(ValidationError::BadAmountFormat);
                }
                match s.parse::<i64>() {
                    Ok(v) => v,
                    // a digit string that overflows i64 is far past the cap
                    Err(_) => return Err(ValidationError::AmountTooLarge),
                }
            }
            _ => return Err(ValidationError::BadAmountFormat),
        };

        amounts.insert(id, amount);

        if amount < AMOUNT_MIN {
            return Err(ValidationError::NonPositiveAmount);
        }
        if amount >= AMOUNT_LIMIT {
            return Err(ValidationError::AmountTooLarge);
        }
    }

    Ok(amounts)
}

/// Joins parsed amounts with the catalog rows the batch lookup resolved.
/// Ids the catalog did not resolve are silently dropped from the result;
/// only a fully empty match fails.
pub fn match_catalog(
    amounts: HashMap<Uuid, i64>,
    catalog: Vec<Ingredient>,
) -> Result<HashMap<Uuid, (Ingredient, i32)>, ValidationError> {
    if catalog.is_empty() {
        return Err(ValidationError::EmptyCatalogMatch);
    }

    let mut resolved = HashMap::with_capacity(catalog.len());
    for ingredient in catalog {
        if let Some(amount) = amounts.get(&ingredient.id) {
            resolved.insert(ingredient.id, (ingredient, *amount as i32));
        }
    }

    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

/// Scalar fields of a recipe update. Absent fields keep their stored
/// value.
#[derive(Debug, Clone, Default)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub image: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

pub fn parse_recipe_form(form: &Form) -> Result<RecipeDraft, ValidationError> {
    let name = check_recipe_name(form.get_str("name")?)?;
    let image = form.get_str("image")?;
    let text = check_recipe_text(form.get_str("text")?)?;
    let cooking_time = match form.contains("cooking_time") {
        true => check_cooking_time(form.get_number("cooking_time")?)?,
        false => COOKING_TIME_DEFAULT,
    };

    Ok(RecipeDraft {
        name,
        image,
        text,
        cooking_time,
    })
}

pub fn parse_recipe_patch(form: &Form) -> Result<RecipePatch, ValidationError> {
    let mut patch = RecipePatch::default();

    if form.contains("name") {
        patch.name = Some(check_recipe_name(form.get_str("name")?)?);
    }
    if form.contains("image") {
        patch.image = Some(form.get_str("image")?);
    }
    if form.contains("text") {
        patch.text = Some(check_recipe_text(form.get_str("text")?)?);
    }
    if form.contains("cooking_time") {
        patch.cooking_time = Some(check_cooking_time(form.get_number("cooking_time")?)?);
    }

    Ok(patch)
}

fn check_recipe_name(name: String) -> Result<String, ValidationError> {
    let len = name.chars().count();
    if len < RECIPE_NAME_MIN_LEN {
        return Err(ValidationError::BadField(String::from(
            "Recipe name is too short",
        )));
    }
    if len > RECIPE_NAME_MAX_LEN {
        return Err(ValidationError::BadField(String::from(
            "Recipe name is too long",
        )));
    }
    Ok(name)
}

fn check_recipe_text(text: String) -> Result<String, ValidationError> {
    if text.chars().count() > RECIPE_TEXT_MAX_LEN {
        return Err(ValidationError::BadField(String::from(
            "Recipe text is too long",
        )));
    }
    Ok(text)
}

fn check_cooking_time(cooking_time: i32) -> Result<i32, ValidationError> {
    if cooking_time < 1 {
        return Err(ValidationError::BadField(String::from(
            "Cooking time must be positive",
        )));
    }
    Ok(cooking_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tag(id: Uuid, slug: &str) -> Tag {
        Tag {
            id,
            name: slug.to_string(),
            slug: slug.to_string(),
            color: format!("#{id:06x}"),
        }
    }

    fn ingredient(id: Uuid, name: &str, unit: &str) -> Ingredient {
        Ingredient {
            id,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
        }
    }

    #[test]
    fn amounts_within_range_are_kept_exactly() {
        for amount in [1, 2, 500, 9999] {
            let parsed = parse_ingredient_entries(&[json!({"id": 1, "amount": amount})]).unwrap();
            assert_eq!(parsed[&1], amount as i64);
        }
    }

    #[test]
    fn digit_strings_parse_like_numbers() {
        let parsed = parse_ingredient_entries(&[json!({"id": 3, "amount": "250"})]).unwrap();
        assert_eq!(parsed[&3], 250);
    }

    #[test]
    fn zero_and_negative_amounts_are_non_positive() {
        for amount in [0, -1, -9999] {
            assert_eq!(
                parse_ingredient_entries(&[json!({"id": 1, "amount": amount})]),
                Err(ValidationError::NonPositiveAmount)
            );
        }
    }

    #[test]
    fn amounts_at_or_over_the_cap_are_too_large() {
        for entry in [
            json!({"id": 1, "amount": 10000}),
            json!({"id": 1, "amount": 123456}),
            json!({"id": 1, "amount": "99999999999999999999"}),
        ] {
            assert_eq!(
                parse_ingredient_entries(&[entry]),
                Err(ValidationError::AmountTooLarge)
            );
        }
    }

    #[test]
    fn non_numeric_amounts_are_rejected() {
        for entry in [
            json!({"id": 1, "amount": "12.5"}),
            json!({"id": 1, "amount": "-3"}),
            json!({"id": 1, "amount": " 3"}),
            json!({"id": 1, "amount": ""}),
            json!({"id": 1, "amount": 2.5}),
            json!({"id": 1, "amount": null}),
            json!({"id": 1}),
            json!({"amount": 2}),
        ] {
            assert_eq!(
                parse_ingredient_entries(&[entry]),
                Err(ValidationError::BadAmountFormat)
            );
        }
    }

    #[test]
    fn empty_submission_is_missing_ingredients() {
        assert_eq!(
            parse_ingredient_entries(&[]),
            Err(ValidationError::MissingIngredients)
        );
    }

    #[test]
    fn duplicate_ids_collapse_to_the_last_amount() {
        let parsed = parse_ingredient_entries(&[
            json!({"id": 7, "amount": 100}),
            json!({"id": 8, "amount": 1}),
            json!({"id": 7, "amount": 250}),
        ])
        .unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&7], 250);
        assert_eq!(parsed[&8], 1);
    }

    #[test]
    fn unresolved_ids_are_dropped_silently() {
        let amounts = parse_ingredient_entries(&[
            json!({"id": 1, "amount": 10}),
            json!({"id": 2, "amount": 20}),
        ])
        .unwrap();

        let resolved = match_catalog(amounts, vec![ingredient(1, "flour", "g")]).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[&1].1, 10);
        assert!(!resolved.contains_key(&2));
    }

    #[test]
    fn empty_catalog_match_fails_the_batch() {
        let amounts = parse_ingredient_entries(&[json!({"id": 9, "amount": 10})]).unwrap();
        assert_eq!(
            match_catalog(amounts, vec![]),
            Err(ValidationError::EmptyCatalogMatch)
        );
    }

    #[test]
    fn tags_fully_resolved_pass_through() {
        let resolved = vec![tag(1, "breakfast"), tag(2, "vegan")];
        assert_eq!(check_tags(&[1, 2], resolved.clone()), Ok(resolved));
    }

    #[test]
    fn unknown_or_repeated_tags_fail_the_cardinality_check() {
        assert_eq!(
            check_tags(&[1, 99], vec![tag(1, "breakfast")]),
            Err(ValidationError::UnknownTag)
        );
        // The lookup collapses duplicates, which the count comparison
        // then treats as a mismatch.
        assert_eq!(
            check_tags(&[1, 1], vec![tag(1, "breakfast")]),
            Err(ValidationError::UnknownTag)
        );
    }

    #[test]
    fn empty_tag_list_is_missing_tags() {
        assert_eq!(check_tags(&[], vec![]), Err(ValidationError::MissingTags));
    }

    #[test]
    fn recipe_form_enforces_scalar_bounds() {
        let ok = Form::from_data(
            serde_json::from_value(json!({
                "name": "Pea soup",
                "image": "images/soup.png",
                "text": "Soak, then simmer.",
                "cooking_time": 90
            }))
            .unwrap(),
        );
        let draft = parse_recipe_form(&ok).unwrap();
        assert_eq!(draft.name, "Pea soup");
        assert_eq!(draft.cooking_time, 90);

        let short = Form::from_data(
            serde_json::from_value(json!({
                "name": "Pi",
                "image": "images/pi.png",
                "text": "?"
            }))
            .unwrap(),
        );
        assert!(parse_recipe_form(&short).is_err());
    }

    #[test]
    fn recipe_patch_only_touches_present_fields() {
        let form = Form::from_data(
            serde_json::from_value(json!({"cooking_time": "15"})).unwrap(),
        );
        let patch = parse_recipe_patch(&form).unwrap();
        assert_eq!(patch.cooking_time, Some(15));
        assert!(patch.name.is_none());
        assert!(patch.image.is_none());
        assert!(patch.text.is_none());
    }
}

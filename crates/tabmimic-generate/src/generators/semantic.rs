//! Semantic text: Cyrillic full names and e-mail addresses.

use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use rand::Rng;

use tabmimic_core::SemanticKind;

const SURNAMES: &[&str] = &[
    "Иванов", "Смирнов", "Кузнецов", "Попов", "Васильев", "Петров", "Соколов", "Михайлов",
    "Новиков", "Федоров", "Морозов", "Волков", "Алексеев", "Лебедев", "Семенов", "Егоров",
    "Павлов", "Козлов", "Степанов", "Никитин", "Орлов", "Захаров", "Зайцев", "Соловьев",
    "Борисов", "Ильин", "Гусев", "Титов", "Калинин", "Романов",
];

const MALE_NAMES: &[&str] = &[
    "Александр", "Алексей", "Андрей", "Дмитрий", "Иван", "Михаил", "Николай", "Павел",
    "Сергей", "Владимир", "Егор", "Константин", "Максим", "Роман", "Юрий", "Олег",
];

const FEMALE_NAMES: &[&str] = &[
    "Анна", "Елена", "Мария", "Ольга", "Наталья", "Татьяна", "Ирина", "Екатерина",
    "Светлана", "Юлия", "Дарья", "Ксения", "Валентина", "Полина", "Вера", "Алина",
];

/// Male and female patronymic forms.
const PATRONYMICS: &[(&str, &str)] = &[
    ("Александрович", "Александровна"),
    ("Алексеевич", "Алексеевна"),
    ("Андреевич", "Андреевна"),
    ("Дмитриевич", "Дмитриевна"),
    ("Иванович", "Ивановна"),
    ("Михайлович", "Михайловна"),
    ("Николаевич", "Николаевна"),
    ("Павлович", "Павловна"),
    ("Сергеевич", "Сергеевна"),
    ("Владимирович", "Владимировна"),
    ("Петрович", "Петровна"),
    ("Викторович", "Викторовна"),
];

pub fn generate<R: Rng + ?Sized>(kind: SemanticKind, rng: &mut R) -> String {
    match kind {
        SemanticKind::FullNameUpper => full_name(rng).to_uppercase(),
        SemanticKind::FullNameTitleCase => full_name(rng),
        SemanticKind::Email => SafeEmail().fake_with_rng(rng),
    }
}

/// `Surname Name Patronymic` with consistent gender.
fn full_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let surname = pick(SURNAMES, rng);
    let (male, female) = PATRONYMICS[rng.random_range(0..PATRONYMICS.len())];
    if rng.random_bool(0.5) {
        format!("{surname} {} {male}", pick(MALE_NAMES, rng))
    } else {
        // every listed surname takes the -а feminine ending
        format!("{surname}а {} {female}", pick(FEMALE_NAMES, rng))
    }
}

fn pick<'a, R: Rng + ?Sized>(items: &[&'a str], rng: &mut R) -> &'a str {
    items[rng.random_range(0..items.len())]
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn full_names_have_three_parts() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let name = generate(SemanticKind::FullNameTitleCase, &mut rng);
            assert_eq!(name.split(' ').count(), 3, "{name}");
            let upper = generate(SemanticKind::FullNameUpper, &mut rng);
            assert_eq!(upper, upper.to_uppercase());
        }
    }

    #[test]
    fn emails_contain_a_domain() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let email = generate(SemanticKind::Email, &mut rng);
        assert!(email.contains('@'), "{email}");
    }
}

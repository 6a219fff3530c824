//! The static level catalog: ten ordered tiers from variables to algorithms.
//!
//! The catalog is immutable at runtime and totally ordered by `level`.
//! Level 1 is always open; every later level opens once the level before it
//! has that entry's `required_to_unlock` correct answers.

use std::sync::OnceLock;

use crate::domain::LevelInfo;

fn make(level: u32, title: &str, description: &str, required_to_unlock: u32) -> LevelInfo {
    LevelInfo {
        level,
        title: title.into(),
        description: description.into(),
        required_to_unlock,
    }
}

/// The ten catalog entries, levels 1..=10, densely ordered.
pub fn level_catalog() -> &'static [LevelInfo] {
    static CATALOG: OnceLock<Vec<LevelInfo>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        vec![
            make(
                1,
                "変数と基本データ型",
                "変数の宣言、数値、文字列、真偽値などの基本的なデータ型について学びます",
                0,
            ),
            make(
                2,
                "演算子と式",
                "算術演算子、比較演算子、論理演算子を使って式を作成する方法を学びます",
                7,
            ),
            make(
                3,
                "条件分岐",
                "if/else文、switch文を使って条件に基づいて処理を分岐させる方法を学びます",
                7,
            ),
            make(
                4,
                "ループと反復処理",
                "for文、while文を使って繰り返し処理を行う方法を学びます",
                7,
            ),
            make(
                5,
                "関数とスコープ",
                "関数の定義、引数、戻り値、変数のスコープについて学びます",
                7,
            ),
            make(
                6,
                "配列と配列操作",
                "配列の作成、要素の追加・削除、配列メソッドの使用方法を学びます",
                7,
            ),
            make(
                7,
                "オブジェクトと参照",
                "オブジェクトの作成、プロパティの操作、参照の概念について学びます",
                7,
            ),
            make(
                8,
                "エラー処理とデバッグ",
                "try/catch文を使ったエラー処理、デバッグの基本テクニックを学びます",
                7,
            ),
            make(
                9,
                "アルゴリズムの基礎",
                "基本的なソートアルゴリズム、検索アルゴリズムについて学びます",
                7,
            ),
            make(
                10,
                "データ構造とアルゴリズム応用",
                "高度なデータ構造とアルゴリズムの実装方法について学びます",
                7,
            ),
        ]
    })
}

/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */
//! Fixed classification tables used to enrich dialing and mailing data.
//!
//! Every table is total: values no rule matches fall back to [`OUTROS`].
//! Rules are evaluated in declaration order and the first match wins.

use serde::{Deserialize, Serialize};

/// Fallback label of every classification
pub const OUTROS: &str = "Outros";

/// Operation a dialing campaign group belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operacao {
  Ativo,
  Manual,
  Receptivo,
  UraCpc,
  Preventivo,
  AgvNegociadora,
  Outros,
}

impl Operacao {
  /// Campaign groups per operation
  pub const RULES: &'static [(Operacao, &'static [i64])] = &[
    (Operacao::Ativo, &[4118]),
    (Operacao::Manual, &[4022]),
    (Operacao::Receptivo, &[4017]),
    (Operacao::UraCpc, &[4047, 4679, 4681, 4683, 4671]),
    (Operacao::Preventivo, &[4433, 4504]),
    (Operacao::AgvNegociadora, &[4326, 4636, 4637, 4649]),
  ];

  pub fn from_grupo(grupo: i64) -> Self {
    Self::RULES
      .iter()
      .find(|(_, grupos)| grupos.contains(&grupo))
      .map(|(operacao, _)| *operacao)
      .unwrap_or(Operacao::Outros)
  }

  pub fn label(&self) -> &'static str {
    match self {
      Operacao::Ativo => "ATIVO",
      Operacao::Manual => "MANUAL",
      Operacao::Receptivo => "RECEPTIVO",
      Operacao::UraCpc => "URA CPC",
      Operacao::Preventivo => "PREVENTIVO",
      Operacao::AgvNegociadora => "AGV NEGOCIADORA",
      Operacao::Outros => OUTROS,
    }
  }
}

impl std::fmt::Display for Operacao {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.label())
  }
}

/// Product a (client, portfolio) pair is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Produto {
  Api,
  AgendaNegativa,
  Equipamentos,
  Outros,
}

impl Produto {
  /// (product, client code, portfolio codes)
  pub const RULES: &'static [(Produto, i64, &'static [i64])] = &[
    (Produto::Api, 228, &[2]),
    (Produto::AgendaNegativa, 198, &[1, 2, 3]),
    (Produto::Equipamentos, 196, &[1, 3, 4]),
  ];

  pub fn from_codes(cod_cli: i64, cod_car: i64) -> Self {
    Self::RULES
      .iter()
      .find(|(_, cli, cars)| *cli == cod_cli && cars.contains(&cod_car))
      .map(|(produto, _, _)| *produto)
      .unwrap_or(Produto::Outros)
  }

  pub fn label(&self) -> &'static str {
    match self {
      Produto::Api => "API",
      Produto::AgendaNegativa => "Agenda Negativa",
      Produto::Equipamentos => "Equipamentos",
      Produto::Outros => OUTROS,
    }
  }

  /// Client codes covered by some product
  pub fn client_codes() -> Vec<i64> {
    let mut codes: Vec<i64> = Self::RULES.iter().map(|(_, cli, _)| *cli).collect();
    codes.sort_unstable();
    codes.dedup();
    codes
  }
}

impl std::fmt::Display for Produto {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.label())
  }
}

/// Delinquency-age bucket (`FX_ATRASO`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FaixaAtraso {
  MenorZero,
  Ate30,
  De31a60,
  De61a90,
  De91a120,
  De121a150,
  De151a180,
  De181a360,
  De361a720,
  Maior720,
}

impl FaixaAtraso {
  /// Upper-inclusive edges of the bounded buckets. Anything below zero is
  /// `Menor 0`, anything above the last edge is `Maior 720`.
  pub const UPPER_EDGES: &'static [(FaixaAtraso, f64)] = &[
    (FaixaAtraso::Ate30, 30.0),
    (FaixaAtraso::De31a60, 60.0),
    (FaixaAtraso::De61a90, 90.0),
    (FaixaAtraso::De91a120, 120.0),
    (FaixaAtraso::De121a150, 150.0),
    (FaixaAtraso::De151a180, 180.0),
    (FaixaAtraso::De181a360, 360.0),
    (FaixaAtraso::De361a720, 720.0),
  ];

  /// Bucket for a days-past-due value. `None` only for NaN.
  pub fn from_dias(dias: f64) -> Option<Self> {
    if dias.is_nan() {
      return None;
    }
    if dias < 0.0 {
      return Some(FaixaAtraso::MenorZero);
    }
    Some(
      Self::UPPER_EDGES
        .iter()
        .find(|(_, upper)| dias <= *upper)
        .map(|(faixa, _)| *faixa)
        .unwrap_or(FaixaAtraso::Maior720),
    )
  }

  pub fn label(&self) -> &'static str {
    match self {
      FaixaAtraso::MenorZero => "Menor 0",
      FaixaAtraso::Ate30 => "0-30",
      FaixaAtraso::De31a60 => "31-60",
      FaixaAtraso::De61a90 => "61-90",
      FaixaAtraso::De91a120 => "91-120",
      FaixaAtraso::De121a150 => "121-150",
      FaixaAtraso::De151a180 => "151-180",
      FaixaAtraso::De181a360 => "181-360",
      FaixaAtraso::De361a720 => "361-720",
      FaixaAtraso::Maior720 => "Maior 720",
    }
  }
}

impl std::fmt::Display for FaixaAtraso {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.label())
  }
}

/// Brazilian area codes (DDD) per state
pub const DDD_ESTADO: &[(&str, &[i64])] = &[
  ("SP", &[11, 12, 13, 14, 15, 16, 17, 18, 19]),
  ("RJ", &[21, 22, 24]),
  ("ES", &[27, 28]),
  ("MG", &[31, 32, 33, 34, 35, 37, 38]),
  ("PR", &[41, 42, 43, 44, 45, 46]),
  ("SC", &[47, 48, 49]),
  ("RS", &[51, 53, 54, 55]),
  ("DF", &[61]),
  ("GO", &[62, 64]),
  ("TO", &[63]),
  ("MT", &[65, 66]),
  ("MS", &[67]),
  ("AC", &[68]),
  ("RO", &[69]),
  ("BA", &[71, 73, 74, 75, 77]),
  ("SE", &[79]),
  ("PE", &[81, 87]),
  ("AL", &[82]),
  ("PB", &[83]),
  ("RN", &[84]),
  ("CE", &[85, 88]),
  ("PI", &[86, 89]),
  ("PA", &[91, 93, 94]),
  ("AM", &[92, 97]),
  ("RR", &[95]),
  ("AP", &[96]),
  ("MA", &[98, 99]),
];

/// State for an area code, [`OUTROS`] when the code is unknown
pub fn estado_por_ddd(ddd: i64) -> &'static str {
  DDD_ESTADO
    .iter()
    .find(|(_, ddds)| ddds.contains(&ddd))
    .map(|(estado, _)| *estado)
    .unwrap_or(OUTROS)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_operacao_known_groups() {
    assert_eq!(Operacao::from_grupo(4118), Operacao::Ativo);
    assert_eq!(Operacao::from_grupo(4017), Operacao::Receptivo);
    assert_eq!(Operacao::from_grupo(4022).label(), "MANUAL");
    assert_eq!(Operacao::from_grupo(4681).label(), "URA CPC");
    assert_eq!(Operacao::from_grupo(4504).label(), "PREVENTIVO");
    assert_eq!(Operacao::from_grupo(4649).to_string(), "AGV NEGOCIADORA");
  }

  #[test]
  fn test_operacao_unmapped_group_is_outros() {
    assert_eq!(Operacao::from_grupo(9999), Operacao::Outros);
    assert_eq!(Operacao::from_grupo(9999).label(), "Outros");
  }

  #[test]
  fn test_operacao_groups_are_disjoint() {
    let mut all: Vec<i64> = Operacao::RULES.iter().flat_map(|(_, g)| g.iter().copied()).collect();
    let total = all.len();
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), total);
  }

  #[test]
  fn test_produto_rules() {
    assert_eq!(Produto::from_codes(228, 2), Produto::Api);
    assert_eq!(Produto::from_codes(228, 1), Produto::Outros);
    assert_eq!(Produto::from_codes(198, 3).label(), "Agenda Negativa");
    assert_eq!(Produto::from_codes(196, 4).label(), "Equipamentos");
    assert_eq!(Produto::from_codes(196, 2), Produto::Outros);
    assert_eq!(Produto::client_codes(), vec![196, 198, 228]);
  }

  #[test]
  fn test_faixa_atraso_boundaries() {
    assert_eq!(FaixaAtraso::from_dias(0.0).unwrap().label(), "0-30");
    assert_eq!(FaixaAtraso::from_dias(30.0).unwrap().label(), "0-30");
    assert_eq!(FaixaAtraso::from_dias(31.0).unwrap().label(), "31-60");
    assert_eq!(FaixaAtraso::from_dias(-1.0).unwrap().label(), "Menor 0");
    assert_eq!(FaixaAtraso::from_dias(720.0).unwrap().label(), "361-720");
    assert_eq!(FaixaAtraso::from_dias(721.0).unwrap().label(), "Maior 720");
    assert_eq!(FaixaAtraso::from_dias(30.5).unwrap().label(), "31-60");
    assert!(FaixaAtraso::from_dias(f64::NAN).is_none());
  }

  #[test]
  fn test_faixa_atraso_is_monotonic() {
    let mut previous = FaixaAtraso::MenorZero;
    for dias in -5..800 {
      let faixa = FaixaAtraso::from_dias(dias as f64).unwrap();
      assert!(faixa >= previous, "bucket went backwards at {dias}");
      previous = faixa;
    }
  }

  #[test]
  fn test_ddd_table_covers_67_codes() {
    let count: usize = DDD_ESTADO.iter().map(|(_, d)| d.len()).sum();
    assert_eq!(count, 67);
    assert_eq!(estado_por_ddd(11), "SP");
    assert_eq!(estado_por_ddd(61), "DF");
    assert_eq!(estado_por_ddd(99), "MA");
    assert_eq!(estado_por_ddd(20), OUTROS);
  }
}

//! # 磁形状因子
//!
//! 偶极近似下的磁形状因子：
//!
//! ```text
//! <j0>(s) = A exp(-a s²) + B exp(-b s²) + C exp(-c s²) + D
//! <j2>(s) = s² [A exp(-a s²) + B exp(-b s²) + C exp(-c s²) + D]
//! f(s)    = (L + 2S) <j0>(s) + L <j2>(s)
//! ```
//! 其中 s = |Q| / 4π = sin(θ)/λ。
//!
//! ## 数据来源
//! ILL Neutron Data Booklet, magnetic form factors (P. J. Brown)。
//! 内置表收录 3d、4d 过渡金属与稀土离子的全部价态，
//! 需要修正或补充的行可通过 `FormFactorTable::from_file` 覆盖。
//!
//! ## 依赖关系
//! - 被 `magnetic/intensity.rs` 调用
//! - 被 `commands/form_factor.rs` 调用

use crate::error::{MandyError, Result};

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// 展开阶数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpansionOrder {
    J0,
    J2,
}

impl ExpansionOrder {
    pub fn index(self) -> u8 {
        match self {
            ExpansionOrder::J0 => 0,
            ExpansionOrder::J2 => 2,
        }
    }

    fn parse(token: &str) -> Option<Self> {
        let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.as_str() {
            "0" => Some(ExpansionOrder::J0),
            "2" => Some(ExpansionOrder::J2),
            _ => None,
        }
    }
}

impl fmt::Display for ExpansionOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<j{}>", self.index())
    }
}

/// 一行展开系数：三对 (A, a) 与常数 D
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub a: [f64; 3],
    pub b: [f64; 3],
    pub c: f64,
}

impl Coefficients {
    /// 按 A a B b C c D 的顺序构造
    pub const fn from_row(row: [f64; 7]) -> Self {
        Coefficients {
            a: [row[0], row[2], row[4]],
            b: [row[1], row[3], row[5]],
            c: row[6],
        }
    }

    /// 高斯展开部分 Σ Aᵢ exp(-aᵢ s²) + D
    pub fn expansion(&self, s: f64) -> f64 {
        let s2 = s * s;
        let mut j = self.c;
        for i in 0..3 {
            j += self.a[i] * (-self.b[i] * s2).exp();
        }
        j
    }

    /// 在给定阶数下求值；<j2> 额外乘 s²
    pub fn evaluate(&self, order: ExpansionOrder, s: f64) -> f64 {
        match order {
            ExpansionOrder::J0 => self.expansion(s),
            ExpansionOrder::J2 => s * s * self.expansion(s),
        }
    }
}

type TableKey = (String, ExpansionOrder);

/// 内置系数表
static BUILTIN: LazyLock<HashMap<TableKey, Coefficients>> = LazyLock::new(|| {
    let rows: &[(&str, ExpansionOrder, [f64; 7])] = &[
        // 3d 过渡金属
        ("Sc0", ExpansionOrder::J0, [0.2512, 90.0296, 0.3290, 39.4021, 0.4235, 14.3222, -0.0043]),
        ("Sc0", ExpansionOrder::J2, [10.8172, 54.3270, 4.7353, 14.8471, 0.6071, 4.2180, 0.0011]),
        ("Sc1", ExpansionOrder::J0, [0.4889, 51.1603, 0.5203, 14.0764, -0.0286, 0.1792, 0.0185]),
        ("Sc1", ExpansionOrder::J2, [8.5021, 34.2851, 3.2116, 10.9940, 0.4244, 3.6055, 0.0009]),
        ("Sc2", ExpansionOrder::J0, [0.5048, 31.4035, 0.5186, 10.9897, -0.0241, 1.1831, 0.0000]),
        ("Sc2", ExpansionOrder::J2, [4.3683, 28.6544, 3.7231, 10.8233, 0.6074, 3.6678, 0.0014]),
        ("Ti0", ExpansionOrder::J0, [0.4657, 33.5898, 0.5490, 9.8791, -0.0291, 0.3232, 0.0123]),
        ("Ti0", ExpansionOrder::J2, [4.3583, 36.0556, 3.8230, 11.1328, 0.6855, 3.4692, 0.0020]),
        ("Ti1", ExpansionOrder::J0, [0.5093, 36.7033, 0.5032, 10.3713, -0.0263, 0.3106, 0.0116]),
        ("Ti1", ExpansionOrder::J2, [6.1567, 27.2754, 2.6833, 8.9829, 0.4070, 3.0524, 0.0011]),
        ("Ti2", ExpansionOrder::J0, [0.5091, 24.9763, 0.5162, 8.7569, -0.0281, 0.9160, 0.0015]),
        ("Ti2", ExpansionOrder::J2, [4.3107, 18.3484, 2.0960, 6.7970, 0.2184, 2.5260, 0.0010]),
        ("Ti3", ExpansionOrder::J0, [0.3571, 22.8413, 0.6688, 8.9306, -0.0354, 0.4833, 0.0099]),
        ("Ti3", ExpansionOrder::J2, [3.3717, 14.4441, 1.8258, 5.7126, 0.2470, 2.2654, 0.0010]),
        ("V0", ExpansionOrder::J0, [0.4086, 28.8109, 0.6077, 8.5437, -0.0295, 0.2768, 0.0123]),
        ("V0", ExpansionOrder::J2, [3.8099, 21.3471, 2.3295, 7.4089, 0.7062, 2.6717, 0.0024]),
        ("V1", ExpansionOrder::J0, [0.4444, 32.6479, 0.5683, 9.0971, -0.2285, 0.0218, 0.2150]),
        ("V1", ExpansionOrder::J2, [4.7474, 23.3226, 2.3609, 7.8082, 0.5106, 2.4811, 0.0010]),
        ("V2", ExpansionOrder::J0, [0.4085, 23.8526, 0.6091, 8.2456, -0.1676, 0.0415, 0.1496]),
        ("V2", ExpansionOrder::J2, [3.4386, 16.5303, 1.9638, 6.1415, 0.2997, 2.2669, 0.0009]),
        ("V3", ExpansionOrder::J0, [0.3598, 19.3364, 0.6632, 7.6172, -0.3064, 0.0296, 0.2835]),
        ("V3", ExpansionOrder::J2, [2.3005, 14.6821, 2.0364, 6.1304, 0.4099, 2.3815, 0.0014]),
        ("V4", ExpansionOrder::J0, [0.3106, 16.8160, 0.7198, 7.0487, -0.0521, 0.3020, 0.0221]),
        ("V4", ExpansionOrder::J2, [1.8377, 12.2668, 1.8247, 5.4578, 0.3979, 2.2483, 0.0012]),
        ("Cr0", ExpansionOrder::J0, [0.1135, 45.1990, 0.3481, 19.4931, 0.5477, 7.3542, -0.0092]),
        ("Cr0", ExpansionOrder::J2, [3.4085, 20.1267, 2.1006, 6.8020, 0.4266, 2.3941, 0.0019]),
        ("Cr1", ExpansionOrder::J0, [-0.0977, 0.0470, 0.4544, 26.0054, 0.5579, 7.4892, 0.0831]),
        ("Cr1", ExpansionOrder::J2, [3.7768, 20.3456, 2.1028, 6.8926, 0.4010, 2.4114, 0.0017]),
        ("Cr2", ExpansionOrder::J0, [1.2024, -0.0055, 0.4158, 20.5475, 0.6032, 6.9560, -1.2218]),
        ("Cr2", ExpansionOrder::J2, [2.6422, 16.0598, 1.9198, 6.2531, 0.4446, 2.3715, 0.0020]),
        ("Cr3", ExpansionOrder::J0, [-0.3094, 0.0274, 0.3680, 17.0355, 0.6559, 6.5236, 0.2856]),
        ("Cr3", ExpansionOrder::J2, [1.6262, 15.0656, 2.0618, 6.2842, 0.5281, 2.3680, 0.0023]),
        ("Cr4", ExpansionOrder::J0, [-0.2320, 0.0433, 0.3101, 14.9518, 0.7182, 6.1726, 0.2042]),
        ("Cr4", ExpansionOrder::J2, [1.0293, 13.9498, 1.9933, 6.0593, 0.5974, 2.3457, 0.0027]),
        ("Mn0", ExpansionOrder::J0, [0.2438, 24.9629, 0.1472, 15.6728, 0.6189, 6.5403, -0.0105]),
        ("Mn0", ExpansionOrder::J2, [2.6681, 16.0601, 1.7561, 5.6396, 0.3675, 2.0488, 0.0017]),
        ("Mn1", ExpansionOrder::J0, [-0.0138, 0.4213, 0.4231, 24.6680, 0.5905, 6.6545, -0.0010]),
        ("Mn1", ExpansionOrder::J2, [3.2953, 18.6950, 1.8792, 6.2403, 0.3927, 2.2007, 0.0022]),
        ("Mn2", ExpansionOrder::J0, [0.4220, 17.6840, 0.5948, 6.0050, 0.0043, -0.6090, -0.0219]),
        ("Mn2", ExpansionOrder::J2, [2.0515, 15.5561, 1.8841, 6.0625, 0.4787, 2.2323, 0.0027]),
        ("Mn3", ExpansionOrder::J0, [0.4198, 14.2829, 0.6054, 5.4689, 0.9241, -0.0088, -0.9498]),
        ("Mn3", ExpansionOrder::J2, [1.2427, 14.9966, 1.9567, 6.1181, 0.5732, 2.2577, 0.0031]),
        ("Mn4", ExpansionOrder::J0, [0.3760, 12.5661, 0.6602, 5.1329, -0.0372, 0.5630, 0.0011]),
        ("Mn4", ExpansionOrder::J2, [0.7879, 13.8857, 1.8717, 5.7433, 0.5981, 2.1818, 0.0034]),
        ("Fe0", ExpansionOrder::J0, [0.0706, 35.0085, 0.3589, 15.3583, 0.5819, 5.5606, -0.0114]),
        ("Fe0", ExpansionOrder::J2, [1.9405, 18.4733, 1.9566, 6.3234, 0.5166, 2.1607, 0.0036]),
        ("Fe1", ExpansionOrder::J0, [0.1251, 34.9633, 0.3629, 15.5144, 0.5223, 5.5914, -0.0105]),
        ("Fe1", ExpansionOrder::J2, [2.6290, 18.6598, 1.8704, 6.3313, 0.4690, 2.1628, 0.0031]),
        ("Fe2", ExpansionOrder::J0, [0.0263, 34.9597, 0.3668, 15.9435, 0.6188, 5.5935, -0.0119]),
        ("Fe2", ExpansionOrder::J2, [1.6490, 16.5593, 1.9064, 6.1325, 0.5206, 2.1370, 0.0035]),
        ("Fe3", ExpansionOrder::J0, [0.3972, 13.2442, 0.6295, 4.9034, -0.0314, 0.3496, 0.0044]),
        ("Fe3", ExpansionOrder::J2, [1.3602, 11.9976, 1.5188, 5.0025, 0.4705, 1.9914, 0.0038]),
        ("Fe4", ExpansionOrder::J0, [0.3782, 11.3800, 0.6556, 4.5920, -0.0346, 0.4833, 0.0005]),
        ("Fe4", ExpansionOrder::J2, [1.5582, 8.2750, 1.1863, 3.2794, 0.1366, 1.1068, -0.0022]),
        ("Co0", ExpansionOrder::J0, [0.4139, 16.1616, 0.6013, 4.7805, -0.1518, 0.0210, 0.1345]),
        ("Co0", ExpansionOrder::J2, [1.9678, 14.1699, 1.4911, 4.9475, 0.3844, 1.7973, 0.0027]),
        ("Co1", ExpansionOrder::J0, [0.0990, 33.1252, 0.3645, 15.1768, 0.5470, 5.0081, -0.0109]),
        ("Co1", ExpansionOrder::J2, [2.4097, 16.1608, 1.5780, 5.4604, 0.4095, 1.9141, 0.0031]),
        ("Co2", ExpansionOrder::J0, [0.4332, 14.3553, 0.5857, 4.6077, -0.0382, 0.1338, 0.0179]),
        ("Co2", ExpansionOrder::J2, [1.9049, 11.6444, 1.3159, 4.3574, 0.3146, 1.6453, 0.0017]),
        ("Co3", ExpansionOrder::J0, [0.3902, 12.5078, 0.6324, 4.4574, -0.1500, 0.0343, 0.1272]),
        ("Co3", ExpansionOrder::J2, [1.7058, 8.8595, 1.1409, 3.3086, 0.1474, 1.0899, -0.0025]),
        ("Co4", ExpansionOrder::J0, [0.3515, 10.7785, 0.6778, 4.2343, -0.0389, 0.2409, 0.0098]),
        ("Co4", ExpansionOrder::J2, [1.3110, 8.5526, 1.1551, 3.4205, 0.1608, 1.2297, -0.0011]),
        ("Ni0", ExpansionOrder::J0, [-0.0172, 35.7392, 0.3174, 14.2689, 0.7136, 4.5661, -0.0143]),
        ("Ni0", ExpansionOrder::J2, [1.0302, 12.2521, 1.4669, 4.7453, 0.4521, 1.7437, 0.0036]),
        ("Ni1", ExpansionOrder::J0, [0.0705, 35.8561, 0.3984, 13.8042, 0.5427, 4.3965, -0.0118]),
        ("Ni1", ExpansionOrder::J2, [2.1040, 14.8655, 1.4302, 5.0714, 0.4031, 1.7784, 0.0034]),
        ("Ni2", ExpansionOrder::J0, [0.0163, 35.8826, 0.3916, 13.2233, 0.6052, 4.3388, -0.0133]),
        ("Ni2", ExpansionOrder::J2, [1.7080, 11.0160, 1.2147, 4.1031, 0.3150, 1.5334, 0.0017]),
        ("Ni3", ExpansionOrder::J0, [-0.0134, 35.8677, 0.2678, 12.3326, 0.7614, 4.2369, -0.0162]),
        ("Ni3", ExpansionOrder::J2, [1.4683, 8.6713, 1.1068, 3.2574, 0.1794, 1.1058, -0.0023]),
        ("Ni4", ExpansionOrder::J0, [-0.0090, 35.8614, 0.2776, 11.7904, 0.7474, 4.2011, -0.0163]),
        ("Ni4", ExpansionOrder::J2, [1.1612, 7.7000, 1.0027, 3.2628, 0.2719, 1.3780, 0.0025]),
        ("Cu0", ExpansionOrder::J0, [0.0909, 34.9838, 0.4088, 11.4432, 0.5128, 3.8248, -0.0124]),
        ("Cu0", ExpansionOrder::J2, [1.9182, 14.4904, 1.3329, 4.7301, 0.3842, 1.6394, 0.0035]),
        ("Cu1", ExpansionOrder::J0, [0.0749, 34.9656, 0.4147, 11.7642, 0.5238, 3.8497, -0.0127]),
        ("Cu1", ExpansionOrder::J2, [1.8814, 13.4333, 1.2809, 4.5446, 0.3646, 1.6022, 0.0033]),
        ("Cu2", ExpansionOrder::J0, [0.0232, 34.9686, 0.4023, 11.5640, 0.5882, 3.8428, -0.0137]),
        ("Cu2", ExpansionOrder::J2, [1.5189, 10.4779, 1.1512, 3.8132, 0.2918, 1.3979, 0.0017]),
        ("Cu3", ExpansionOrder::J0, [0.0031, 34.9074, 0.3582, 10.9138, 0.6531, 3.8279, -0.0147]),
        ("Cu3", ExpansionOrder::J2, [1.2797, 8.4502, 1.0315, 3.2796, 0.2401, 1.2498, 0.0015]),
        ("Cu4", ExpansionOrder::J0, [-0.0132, 30.6817, 0.2801, 11.1626, 0.7490, 3.8172, -0.0165]),
        ("Cu4", ExpansionOrder::J2, [0.9568, 7.4481, 0.9099, 3.3964, 0.3729, 1.4936, 0.0049]),
        // 4d 过渡金属
        ("Y0", ExpansionOrder::J0, [0.5915, 67.6081, 1.5123, 17.9004, -1.1130, 14.1359, 0.0080]),
        ("Y0", ExpansionOrder::J2, [14.4084, 44.6577, 5.1045, 14.9043, -0.0535, 3.3189, 0.0028]),
        ("Zr0", ExpansionOrder::J0, [0.4106, 59.9961, 1.0543, 18.6476, -0.4751, 10.5400, 0.0106]),
        ("Zr0", ExpansionOrder::J2, [10.1378, 35.3372, 4.7734, 12.5453, -0.0489, 2.6721, 0.0036]),
        ("Zr1", ExpansionOrder::J0, [0.4532, 59.5948, 0.7834, 21.4357, -0.2451, 9.0360, 0.0098]),
        ("Zr1", ExpansionOrder::J2, [11.8722, 34.9200, 4.0502, 12.1266, -0.0632, 2.8278, 0.0034]),
        ("Nb0", ExpansionOrder::J0, [0.3946, 49.2297, 1.3197, 14.8216, -0.7269, 9.6156, 0.0129]),
        ("Nb0", ExpansionOrder::J2, [7.4796, 33.1789, 5.0884, 11.5708, -0.0281, 1.5635, 0.0047]),
        ("Nb1", ExpansionOrder::J0, [0.4572, 49.9182, 1.0274, 15.7256, -0.4962, 9.1573, 0.0118]),
        ("Nb1", ExpansionOrder::J2, [8.7735, 34.2592, 4.6556, 11.5574, -0.0268, 1.4793, 0.0044]),
        ("Mo0", ExpansionOrder::J0, [0.1806, 49.0568, 1.2306, 14.7859, -0.4268, 6.9866, 0.0171]),
        ("Mo0", ExpansionOrder::J2, [5.1180, 23.4217, 4.1809, 9.2080, -0.0505, 1.7434, 0.0053]),
        ("Mo1", ExpansionOrder::J0, [0.3500, 48.0354, 1.0305, 15.0604, -0.3929, 7.4790, 0.0139]),
        ("Mo1", ExpansionOrder::J2, [7.2367, 28.1282, 4.0705, 9.9228, -0.0317, 1.4552, 0.0049]),
        ("Tc0", ExpansionOrder::J0, [0.1298, 49.6611, 1.1656, 14.1307, -0.3134, 5.5129, 0.0195]),
        ("Tc0", ExpansionOrder::J2, [4.2441, 21.3974, 3.9439, 8.3753, -0.0371, 1.1870, 0.0066]),
        ("Tc1", ExpansionOrder::J0, [0.2674, 48.9566, 0.9569, 15.1413, -0.2387, 5.4578, 0.0160]),
        ("Tc1", ExpansionOrder::J2, [6.4056, 24.8245, 3.5400, 8.6112, -0.0366, 1.4846, 0.0044]),
        ("Ru0", ExpansionOrder::J0, [0.1069, 49.4238, 1.1912, 12.7417, -0.3176, 4.9125, 0.0213]),
        ("Ru0", ExpansionOrder::J2, [3.7445, 18.6128, 3.4749, 7.4201, -0.0363, 1.0068, 0.0073]),
        ("Ru1", ExpansionOrder::J0, [0.4410, 33.3086, 1.4775, 9.5531, -0.9361, 6.7220, 0.0176]),
        ("Ru1", ExpansionOrder::J2, [5.2826, 23.6832, 3.5813, 8.1521, -0.0257, 0.4255, 0.0131]),
        ("Rh0", ExpansionOrder::J0, [0.0976, 49.8825, 1.1601, 11.8307, -0.2789, 4.1266, 0.0234]),
        ("Rh0", ExpansionOrder::J2, [3.3651, 17.3444, 3.2121, 6.8041, -0.0350, 0.5031, 0.0146]),
        ("Rh1", ExpansionOrder::J0, [0.3342, 29.7564, 1.2209, 9.4384, -0.5755, 5.3320, 0.0210]),
        ("Rh1", ExpansionOrder::J2, [4.0260, 18.9497, 3.1663, 6.9998, -0.0296, 0.4862, 0.0127]),
        ("Pd0", ExpansionOrder::J0, [0.2003, 29.3633, 1.1446, 9.5993, -0.3689, 4.0423, 0.0251]),
        ("Pd0", ExpansionOrder::J2, [3.3105, 14.7265, 2.6332, 5.8618, -0.0438, 1.1303, 0.0053]),
        ("Pd1", ExpansionOrder::J0, [0.5033, 24.5037, 1.9982, 6.9082, -1.5240, 5.5133, 0.0213]),
        ("Pd1", ExpansionOrder::J2, [4.2749, 17.9002, 2.7021, 6.3541, -0.0258, 0.6999, 0.0071]),
        // 稀土
        ("Ce2", ExpansionOrder::J0, [0.2953, 17.6846, 0.2923, 6.7329, 0.4313, 5.3827, -0.0194]),
        ("Ce2", ExpansionOrder::J2, [0.9809, 18.0630, 1.8413, 7.7688, 0.9905, 2.8452, 0.0120]),
        ("Pr3", ExpansionOrder::J0, [0.0504, 24.9989, 0.2572, 12.0377, 0.7142, 5.0039, -0.0219]),
        ("Pr3", ExpansionOrder::J2, [0.8734, 18.9876, 1.5594, 6.0872, 0.8142, 2.4150, 0.0111]),
        ("Nd2", ExpansionOrder::J0, [0.1645, 25.0453, 0.2522, 11.9782, 0.6012, 4.9461, -0.0180]),
        ("Nd2", ExpansionOrder::J2, [1.4530, 18.3398, 1.6196, 7.2854, 0.8752, 2.6224, 0.0126]),
        ("Nd3", ExpansionOrder::J0, [0.0540, 25.0293, 0.3101, 12.1020, 0.6575, 4.7223, -0.0216]),
        ("Nd3", ExpansionOrder::J2, [0.6751, 18.3421, 1.6272, 7.2600, 0.9644, 2.6016, 0.0150]),
        ("Sm2", ExpansionOrder::J0, [0.0909, 25.2032, 0.3037, 11.8562, 0.6250, 4.2366, -0.0200]),
        ("Sm2", ExpansionOrder::J2, [1.0360, 18.4249, 1.4769, 7.0321, 0.8810, 2.4367, 0.0152]),
        ("Sm3", ExpansionOrder::J0, [0.0288, 25.2068, 0.2973, 11.8311, 0.6954, 4.2117, -0.0213]),
        ("Sm3", ExpansionOrder::J2, [0.4707, 18.4301, 1.4261, 7.0336, 0.9574, 2.4387, 0.0182]),
        ("Eu2", ExpansionOrder::J0, [0.0755, 25.2960, 0.3001, 11.5993, 0.6438, 4.0252, -0.0196]),
        ("Eu2", ExpansionOrder::J2, [0.8970, 18.4429, 1.3769, 7.0054, 0.9060, 2.4213, 0.0190]),
        ("Eu3", ExpansionOrder::J0, [0.0204, 25.3078, 0.3010, 11.4744, 0.7005, 3.9420, -0.0220]),
        ("Eu3", ExpansionOrder::J2, [0.3985, 18.4514, 1.3307, 6.9556, 0.9603, 2.3780, 0.0197]),
        ("Gd2", ExpansionOrder::J0, [0.0636, 25.3823, 0.3033, 11.2125, 0.6528, 3.7877, -0.0199]),
        ("Gd2", ExpansionOrder::J2, [0.7756, 18.4695, 1.3124, 6.8990, 0.8956, 2.3383, 0.0199]),
        ("Gd3", ExpansionOrder::J0, [0.0186, 25.3867, 0.2895, 11.1421, 0.7135, 3.7520, -0.0217]),
        ("Gd3", ExpansionOrder::J2, [0.3347, 18.4758, 1.2465, 6.8767, 0.9537, 2.3184, 0.0217]),
        ("Tb2", ExpansionOrder::J0, [0.0547, 25.5086, 0.3171, 10.5911, 0.6490, 3.5171, -0.0212]),
        ("Tb2", ExpansionOrder::J2, [0.6688, 18.4909, 1.2487, 6.8219, 0.8888, 2.2751, 0.0215]),
        ("Tb3", ExpansionOrder::J0, [0.0177, 25.5095, 0.2921, 10.5769, 0.7133, 3.5122, -0.0231]),
        ("Tb3", ExpansionOrder::J2, [0.2892, 18.4973, 1.1678, 6.7972, 0.9437, 2.2573, 0.0232]),
        ("Dy2", ExpansionOrder::J0, [0.1308, 18.3155, 0.3118, 7.6645, 0.5795, 3.1469, -0.0226]),
        ("Dy2", ExpansionOrder::J2, [0.5917, 18.5114, 1.1828, 6.7465, 0.8801, 2.2141, 0.0229]),
        ("Dy3", ExpansionOrder::J0, [0.1157, 15.0732, 0.3270, 6.7991, 0.5821, 3.0202, -0.0249]),
        ("Dy3", ExpansionOrder::J2, [0.2523, 18.5172, 1.0914, 6.7362, 0.9345, 2.2082, 0.0250]),
        ("Ho2", ExpansionOrder::J0, [0.0995, 18.1761, 0.3305, 7.8556, 0.5921, 2.9799, -0.0230]),
        ("Ho2", ExpansionOrder::J2, [0.5094, 18.5155, 1.1234, 6.7455, 0.8727, 2.1589, 0.0242]),
        ("Ho3", ExpansionOrder::J0, [0.0566, 18.3176, 0.3365, 7.6880, 0.6317, 2.9427, -0.0248]),
        ("Ho3", ExpansionOrder::J2, [0.2188, 18.5157, 1.0240, 6.7070, 0.9251, 2.1614, 0.0268]),
        ("Er2", ExpansionOrder::J0, [0.1122, 18.1223, 0.3462, 6.9106, 0.5649, 2.7614, -0.0235]),
        ("Er2", ExpansionOrder::J2, [0.4693, 18.5278, 1.0545, 6.6493, 0.8679, 2.1201, 0.0261]),
        ("Er3", ExpansionOrder::J0, [0.0586, 17.9802, 0.3540, 7.0964, 0.6126, 2.7482, -0.0251]),
        ("Er3", ExpansionOrder::J2, [0.1710, 18.5337, 0.9879, 6.6246, 0.9044, 2.1004, 0.0278]),
        ("Tm2", ExpansionOrder::J0, [0.0983, 18.3236, 0.3380, 6.9178, 0.5875, 2.6622, -0.0241]),
        ("Tm2", ExpansionOrder::J2, [0.4198, 18.5417, 0.9959, 6.6002, 0.8593, 2.0818, 0.0284]),
        ("Tm3", ExpansionOrder::J0, [0.0581, 15.0922, 0.2787, 7.8015, 0.6854, 2.7931, -0.0224]),
        ("Tm3", ExpansionOrder::J2, [0.1760, 18.5417, 0.9105, 6.5787, 0.8970, 2.0622, 0.0294]),
        ("Yb2", ExpansionOrder::J0, [0.0855, 18.5123, 0.2943, 7.3734, 0.6412, 2.6777, -0.0213]),
        ("Yb2", ExpansionOrder::J2, [0.3852, 18.5500, 0.9415, 6.5507, 0.8492, 2.0425, 0.0301]),
        ("Yb3", ExpansionOrder::J0, [0.0416, 16.0949, 0.2849, 7.8341, 0.6961, 2.6725, -0.0229]),
        ("Yb3", ExpansionOrder::J2, [0.1570, 18.5553, 0.8484, 6.5403, 0.8880, 2.0367, 0.0318]),
    ];

    rows.iter()
        .map(|(ion, order, row)| ((ion.to_string(), *order), Coefficients::from_row(*row)))
        .collect()
});

/// 形状因子系数表
///
/// 默认只含内置数据；`from_file` 加载的行会覆盖同名内置行。
#[derive(Debug, Clone, Default)]
pub struct FormFactorTable {
    extra: HashMap<TableKey, Coefficients>,
}

impl FormFactorTable {
    /// 仅使用内置数据
    pub fn builtin() -> Self {
        Self::default()
    }

    /// 加载 ILL 文本格式的系数表
    ///
    /// 每行：`离子 阶数 A a B b C c D`，数值可写成 `A=0.0263` 的形式，
    /// `#` 开头为注释。例如：
    /// ```text
    /// Nb0  <j0>  A=0.3055 a=30.4681 B=0.4065 b=11.8811 C=-0.1455 c=0.0000 D=0.0000
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| MandyError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_content(&content, &path.display().to_string())
    }

    /// 从字符串内容解析系数表
    pub fn from_content(content: &str, source: &str) -> Result<Self> {
        let mut extra = HashMap::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parse_error = |reason: String| MandyError::ParseError {
                format: "form factor table".to_string(),
                path: source.to_string(),
                reason: format!("line {}: {}", line_no + 1, reason),
            };

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 9 {
                return Err(parse_error(format!(
                    "expected ion, order and 7 coefficients, found {} fields",
                    tokens.len()
                )));
            }

            let order = ExpansionOrder::parse(tokens[1])
                .ok_or_else(|| parse_error(format!("unknown expansion order '{}'", tokens[1])))?;

            let mut row = [0.0; 7];
            for (slot, token) in row.iter_mut().zip(tokens[2..9].iter().copied()) {
                let value = token.rsplit('=').next().unwrap_or(token);
                *slot = value
                    .parse()
                    .map_err(|_| parse_error(format!("invalid coefficient '{}'", token)))?;
            }

            extra.insert((tokens[0].to_string(), order), Coefficients::from_row(row));
        }

        Ok(FormFactorTable { extra })
    }

    /// 合并另一张表，`other` 中的行优先
    pub fn merge(&mut self, other: FormFactorTable) {
        self.extra.extend(other.extra);
    }

    /// 查找系数；离子不在表中为配置错误
    pub fn lookup(&self, ion: &str, order: ExpansionOrder) -> Result<Coefficients> {
        let key = (ion.to_string(), order);
        self.extra
            .get(&key)
            .or_else(|| BUILTIN.get(&key))
            .copied()
            .ok_or_else(|| MandyError::UnknownIon {
                ion: ion.to_string(),
                order: order.index(),
            })
    }

    /// 为离子与量子数解析出完整的形状因子
    pub fn resolve(&self, ion: &str, l: f64, s: f64) -> Result<MagneticFormFactor> {
        Ok(MagneticFormFactor {
            j0: self.lookup(ion, ExpansionOrder::J0)?,
            j2: self.lookup(ion, ExpansionOrder::J2)?,
            l,
            s,
        })
    }

    /// 表中全部离子名（排序、去重）
    pub fn ions(&self) -> Vec<String> {
        let mut ions: Vec<String> = BUILTIN
            .keys()
            .chain(self.extra.keys())
            .map(|(ion, _)| ion.clone())
            .collect();
        ions.sort();
        ions.dedup();
        ions
    }
}

/// 已解析的离子形状因子
#[derive(Debug, Clone, Copy)]
pub struct MagneticFormFactor {
    j0: Coefficients,
    j2: Coefficients,
    l: f64,
    s: f64,
}

impl MagneticFormFactor {
    /// f(s) = (L + 2S) <j0> + L <j2>
    pub fn at(&self, s: f64) -> f64 {
        (self.l + 2.0 * self.s) * self.j0.evaluate(ExpansionOrder::J0, s)
            + self.l * self.j2.evaluate(ExpansionOrder::J2, s)
    }

    pub fn squared_at(&self, s: f64) -> f64 {
        let f = self.at(s);
        f * f
    }

    /// Q = 0 处的值，用于归一化
    pub fn normalization(&self) -> f64 {
        self.at(0.0)
    }

    /// f(s) / f(0)；L = S = 0 时 f(0) = 0，返回 0
    pub fn normalized(&self, s: f64) -> f64 {
        let norm = self.normalization();
        if norm == 0.0 {
            return 0.0;
        }
        self.at(s) / norm
    }

    /// [f(s) / f(0)]²
    pub fn normalized_squared(&self, s: f64) -> f64 {
        let norm = self.normalization();
        if norm == 0.0 {
            return 0.0;
        }
        self.squared_at(s) / (norm * norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_j0_is_unity_at_origin() {
        let table = FormFactorTable::builtin();
        for ion in table.ions() {
            let j0 = table.lookup(&ion, ExpansionOrder::J0).unwrap();
            let value = j0.evaluate(ExpansionOrder::J0, 0.0);
            assert!(
                (value - 1.0).abs() < 5e-3,
                "{} <j0>(0) should be close to 1, got {}",
                ion,
                value
            );
        }
    }

    #[test]
    fn test_j2_vanishes_at_origin() {
        let j2 = FormFactorTable::builtin()
            .lookup("Fe2", ExpansionOrder::J2)
            .unwrap();
        assert_eq!(j2.evaluate(ExpansionOrder::J2, 0.0), 0.0);
    }

    #[test]
    fn test_form_factor_at_zero_is_normalization() {
        let table = FormFactorTable::builtin();
        let (l, s) = (2.0, 2.0);
        let ff = table.resolve("Fe2", l, s).unwrap();
        let f0 = ff.at(0.0);

        assert_eq!(f0, ff.normalization());
        // (L + 2S) <j0>(0)
        assert!((f0 - 6.0).abs() < 1e-2);
        assert!((ff.normalized(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_squared_matches_square() {
        let ff = FormFactorTable::builtin().resolve("Cr3", 3.0, 1.5).unwrap();
        for q in [0.0, 0.05, 0.1, 0.25, 0.5, 0.8] {
            let f = ff.normalized(q);
            assert!((ff.normalized_squared(q) - f * f).abs() < 1e-12);
            assert_eq!(ff.squared_at(q), ff.at(q) * ff.at(q));
        }
        assert!((ff.normalized_squared(0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_quantum_numbers_square_to_zero() {
        let ff = FormFactorTable::builtin().resolve("Ni2", 0.0, 0.0).unwrap();
        assert_eq!(ff.normalized_squared(0.2), 0.0);
    }

    #[test]
    fn test_builtin_covers_transition_and_rare_earth_ions() {
        let table = FormFactorTable::builtin();
        for ion in ["Cr1", "Nb0", "Mn3", "Ni2", "Gd3", "Ho3", "Fe2", "Pd1", "Yb3"] {
            assert!(table.lookup(ion, ExpansionOrder::J0).is_ok(), "{} <j0> missing", ion);
            assert!(table.lookup(ion, ExpansionOrder::J2).is_ok(), "{} <j2> missing", ion);
        }
        // 每个离子都同时有 <j0> 与 <j2>
        let ions = table.ions();
        for ion in &ions {
            assert!(table.lookup(ion, ExpansionOrder::J2).is_ok(), "{} <j2> missing", ion);
        }
        assert!(ions.len() > 70);
    }

    #[test]
    fn test_rare_earth_j0_decays_slower_than_3d() {
        // 4f 壳层比 3d 更局域，<j0> 在同样的 s 下衰减更慢
        let table = FormFactorTable::builtin();
        let gd = table.lookup("Gd3", ExpansionOrder::J0).unwrap();
        let mn = table.lookup("Mn2", ExpansionOrder::J0).unwrap();
        assert!(gd.expansion(0.3) > mn.expansion(0.3));
    }

    #[test]
    fn test_form_factor_decays() {
        let ff = FormFactorTable::builtin().resolve("Fe3", 0.0, 2.5).unwrap();
        let values: Vec<f64> = (0..6).map(|i| ff.normalized(0.1 * i as f64)).collect();
        for pair in values.windows(2) {
            assert!(pair[1] < pair[0], "form factor should decay: {:?}", values);
        }
    }

    #[test]
    fn test_zero_quantum_numbers_normalize_to_zero() {
        let ff = FormFactorTable::builtin().resolve("Cr0", 0.0, 0.0).unwrap();
        assert_eq!(ff.normalized(0.3), 0.0);
    }

    #[test]
    fn test_unknown_ion() {
        let table = FormFactorTable::builtin();
        assert!(matches!(
            table.resolve("Xx9", 2.0, 2.5),
            Err(MandyError::UnknownIon { ref ion, order: 0 }) if ion == "Xx9"
        ));
    }

    #[test]
    fn test_table_from_content() {
        let content = "\
# ion  order  A a B b C c D
Nb0 <j0> A=0.3055 a=30.4681 B=0.4065 b=11.8811 C=-0.1455 c=0.1000 D=0.4335
Nb0 2    1.0 10.0 0.5 5.0 0.1 1.0 0.002
Fe2 0    0.5 1.0 0.5 1.0 0.0 1.0 0.0
";
        let table = FormFactorTable::from_content(content, "inline").unwrap();

        let j0 = table.lookup("Nb0", ExpansionOrder::J0).unwrap();
        assert_eq!(j0.a, [0.3055, 0.4065, -0.1455]);
        assert_eq!(j0.c, 0.4335);
        assert!(table.lookup("Nb0", ExpansionOrder::J2).is_ok());

        // 覆盖内置行
        let fe2 = table.lookup("Fe2", ExpansionOrder::J0).unwrap();
        assert_eq!(fe2.a[0], 0.5);
        // 未覆盖的内置行仍然可用
        assert!(table.lookup("Fe2", ExpansionOrder::J2).is_ok());
    }

    #[test]
    fn test_merge_prefers_later_table() {
        let mut table = FormFactorTable::from_content("Nb0 0 1.0 1.0 0.0 1.0 0.0 1.0 0.0", "first").unwrap();
        table.merge(FormFactorTable::from_content("Nb0 0 0.5 1.0 0.0 1.0 0.0 1.0 0.0", "second").unwrap());

        let j0 = table.lookup("Nb0", ExpansionOrder::J0).unwrap();
        assert_eq!(j0.a[0], 0.5);
    }

    #[test]
    fn test_table_rejects_short_rows() {
        let result = FormFactorTable::from_content("Nb0 0 1.0 2.0", "inline");
        assert!(matches!(result, Err(MandyError::ParseError { .. })));
    }
}

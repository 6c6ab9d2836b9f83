use crate::registers::*;

pub const CONFIG_ACCEL_INIT: &[RegConfig<AccelReg>] = &[
    RegConfig {
        reg: AccelReg::CtrlReg6Xl,
        value: (XlOdr::Hz10 as u8) << XL_ODR_LOC | (XlFullScale::G2 as u8) << XL_FS_LOC, // 10 Hz, ±2 g
    },
];

pub const CONFIG_MAG_INIT: &[RegConfig<MagReg>] = &[
    RegConfig {
        reg: MagReg::CtrlReg1M,
        value: CtrlReg1MFlags::TEMP_COMP.bits()
            | (MagOM::LowPowerMode as u8) << MAG_OM_LOC
            | (MagOdr::Hz10 as u8) << MAG_DO_LOC,
    },
    RegConfig {
        reg: MagReg::CtrlReg2M,
        value: CtrlReg2MFlags::REBOOT.bits()
            | CtrlReg2MFlags::SOFT_RST.bits()
            | (MagFullScale::Gauss4 as u8) << MAG_FS_LOC, // ±4 gauss
    },
    RegConfig {
        reg: MagReg::CtrlReg3M,
        value: MagConvMode::Continuous as u8, // Continuous-conversion mode
    },
];
